//! Clipboard copy through the terminal (OSC 52).
//!
//! Works over SSH and inside multiplexers that pass OSC 52 through; no
//! platform clipboard library is needed.

use std::io::{self, Write};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use crossterm::execute;
use crossterm::style::Print;

pub(crate) fn osc52_sequence(text: &str) -> String {
    let encoded = STANDARD.encode(text.as_bytes());
    format!("\x1b]52;c;{encoded}\x1b\\")
}

pub(crate) fn copy_to<W: Write>(out: &mut W, text: &str) -> io::Result<()> {
    execute!(out, Print(osc52_sequence(text)))
}
