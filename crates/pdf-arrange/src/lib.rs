pub mod assembly;
pub mod backend;
mod cancel;
pub mod constants;
mod controller;
pub mod geometry;
mod io;
mod model;
mod options;
pub mod render;
pub mod resolver;
pub mod session;
mod types;

pub use assembly::{AssembledDocument, AssemblyJob, AssemblyPipeline, suggested_filename};
pub use backend::{AssemblyBackend, LoadOptions, LopdfBackend};
pub use cancel::*;
pub use controller::*;
pub use geometry::{EntryBox, Point, Rect, SlotLayout};
pub use io::{SourceFile, read_source, write_output};
pub use model::*;
pub use options::*;
pub use render::{
    OutlineDocument, OutlineRenderer, PageRenderingService, RasterImage, RenderDocument,
    RenderedDocument, render_thumbnails,
};
pub use resolver::{DropTarget, DropTargetResolver, resolve_drop_target};
pub use session::{DragEffect, DragEvent, DragSession, DragState};
pub use types::*;
