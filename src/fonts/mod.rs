//! Font bookkeeping
//!
//! Everything the agent knows about fonts lives here:
//!
//! - `validator` - magic-byte sniffing of candidate files
//! - `registry` - the in-memory catalog of fonts in the managed directory
//! - `registrar` - the platform side effect that makes a font usable

pub mod registrar;
pub mod registry;
pub mod validator;

pub use registrar::{FontRegistrar, FontconfigRegistrar, NullRegistrar, RegistrarError};
pub use registry::{font_id, FontRecord, FontRegistry};
pub use validator::{detect, is_font, sniff_file, sniff_reader, FontKind, SNIFF_LEN};
