//! Height data around the map core: synthesizer height-field ingestion,
//! fBm detail noise, greyscale debug images and the tectonic/tile pipeline.

pub mod debug_image;
pub mod detail;
pub mod heightfield;
pub mod pipeline;

pub use debug_image::{DebugImageError, GreyRange, greyscale_pixels, save_png, write_png};
pub use detail::{DetailParams, DetailSampler, apply_detail};
pub use heightfield::{FilledRows, HeightField, HeightFieldError};
pub use pipeline::{PipelineError, build_detail_atlas, build_tectonic_atlas, build_tile_height};
