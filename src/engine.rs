//! Scanning engine.
//!
//! The engine owns the input text, the lexeme being built and two state
//! machines that together describe where scanning stands:
//!
//! ```text
//! line positioning                      token recognition
//!
//! AtLineStart ──indentation──> After-   WaitingForInput ──input──> Ready <──────────┐
//!     │                        Indent.                               │              │
//!     └──────expected char──┐     │                          expected char     token_enqueued
//!                           v     v                                  v              │
//!                        InLineBody ──eol──> AtLineEnd          Tokenizing ──> Recognized
//!                                               │                    │    \
//!                 <──────────after_eol──────────┘              unexpected  eos
//!                                                                    v      v
//!                                                                 Failed  Aborted   (Ready --eos--> Done)
//! ```
//!
//! A single primitive, [`Engine::scan`], moves both machines:
//!
//! 1. a recognized token left over from the previous call is released;
//! 2. a pending line end is consumed and a new line begins;
//! 3. at the start of a line, indentation is reported as its own outcome;
//! 4. noise is skipped;
//! 5. end of stream and line ends are reported before any pattern is tried;
//! 6. finally the caller's pattern is matched at the scan position.
//!
//! ## Responsibilities by module
//!
//! - `state.rs`: the two transition tables, pure and separately testable.
//! - `scanner.rs`: [`Engine`] itself: scan, next_char, undo, positions.
//! - `snapshot.rs`: saved engine state for speculative scanning.
//! - `config.rs`: eol / noise / indentation patterns.
//!
//! Snapshots are never taken by the engine itself; rules push and pop them
//! around tentative matches and must keep pushes and pops balanced.

#[path = "engine/config.rs"]
mod config;
#[path = "engine/scanner.rs"]
mod scanner;
#[path = "engine/snapshot.rs"]
mod snapshot;
#[path = "engine/state.rs"]
mod state;


pub use config::EngineConfig;
pub use scanner::{Engine, ScanOutcome};
pub use snapshot::EngineSnapshot;
pub use state::{LineEntry, LineEvent, LineState, RecognitionEntry, RecognitionEvent, RecognitionState};
