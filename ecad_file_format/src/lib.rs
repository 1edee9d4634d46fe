pub mod bom;
mod convert;
mod csv_util;
pub mod designator;
mod error;
pub mod format;
pub mod paired;
pub mod pnp;
mod text_util;
pub mod writer;

pub use bom::load_bom_components;
pub use convert::{ConversionReport, ConvertConfig, convert_bom, convert_positions};
pub use designator::Designator;
pub use error::{ConvertError, Result, Warning};
pub use format::{Artifact, EcadFamily, detect_format};
pub use pnp::{Side, load_component_positions};
