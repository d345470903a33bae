//! cantor-services: File formats and the external synthesizer process

pub mod midi_file;
pub mod synth;
pub mod wav;

pub use midi_file::{load_score, parse_score};
pub use synth::{CommandSynthesizer, DEFAULT_ARGS};
pub use wav::{read_wav, write_wav};
