// graphicsbc: interpreter for a compact, character-oriented drawing
// language.
//
// This program is free software: you can redistribute it and/or
// modify it under the terms of the GNU Lesser General Public License
// as published by the Free Software Foundation, either version 3 of
// the License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
// Lesser General Public License for more details.
//
// You should have received a copy of the GNU Lesser General Public
// License along with this program.  If not, see
// <https://www.gnu.org/licenses/>.

pub mod ast;
pub mod bot;
pub mod canvas;
pub mod error;
pub mod interp;
pub mod parser;
#[macro_use]
pub mod util;
pub mod value;

use std::path::Path;

use crate::canvas::{CairoCanvas, Canvas};
use crate::error::InterpretError;
use crate::interp::Context;
use crate::parser::Parser;

/// Runs one program end to end: parse, interpret, save. Used by both the
/// CLI and the feed listener so the two surfaces share one pipeline.
pub fn run_program(source: &str, output: &Path) -> Result<(), InterpretError> {
    let root = Parser::parse(source)?;
    let canvas = CairoCanvas::new().map_err(|e| InterpretError::Canvas(e.to_string()))?;
    let mut ctx = Context::new(canvas);
    interp::run(&root, &mut ctx)?;
    ctx.canvas
        .save(output)
        .map_err(|e| InterpretError::Canvas(e.to_string()))
}
