// Copyright (c) 2024 The tomasulo-rust contributors
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.
//

// trace.rs
//
// This file contains the trace file writer used by the command-line
// runner for `--output`: cycle-stamped event lines plus preformatted
// blocks such as the pipeline state dump. Write failures propagate to
// the caller; console logging goes through the `log` crate instead.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

pub struct TraceLog {
    file: File,
}

impl TraceLog {
    pub fn create(path: &Path) -> io::Result<Self> {
        Ok(Self {
            file: File::create(path)?,
        })
    }

    /// A `=== title ===` divider between trace sections.
    pub fn section(&mut self, title: &str) -> io::Result<()> {
        writeln!(self.file, "=== {} ===", title)
    }

    /// A single cycle-stamped event line.
    pub fn record(&mut self, cycle: usize, message: &str) -> io::Result<()> {
        writeln!(self.file, "[cycle {}] {}", cycle, message)
    }

    /// A preformatted multi-line block, e.g. a pipeline state dump.
    pub fn block(&mut self, text: &str) -> io::Result<()> {
        for line in text.lines() {
            writeln!(self.file, "{}", line)?;
        }
        Ok(())
    }
}
