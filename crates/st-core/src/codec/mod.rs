//! Text codecs for the two structured file kinds found in a study.
//!
//! - [`ini`]: sectioned `key = value` files, typed per key on read
//! - [`matrix`]: whitespace/comma separated numeric grids

pub mod ini;
pub mod matrix;

pub use ini::{IniReader, IniSpec, IniTypes, IniWriter, RawSections, ScalarType, SectionSpec, SectionTypes};
pub use matrix::{MatrixReader, MatrixWriter};
