pub mod config;
pub mod forests;
pub mod labels;
pub mod mountains;
pub mod noise;
pub mod pipeline;
pub mod render;
pub mod rivers;
pub mod rng;
pub mod roads;
pub mod session;
pub mod settlements;
pub mod terrain;

pub use config::{ConfigError, GenerationConfig, MapStyle, WorldFile};
pub use pipeline::{WorldMap, generate};
pub use render::render_map;
pub use session::{MapSession, Ticket};
