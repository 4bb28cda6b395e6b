//! Canonical, vendor-agnostic request and result types
//!
//! Every adapter converts from these shapes into its vendor wire format and
//! back. Nothing in here knows about a particular vendor beyond the [`Vendor`]
//! tag itself.

pub mod message;
pub mod request;
pub mod result;
pub mod tool;
pub mod vendor;

pub use message::{InlineImage, Message, Role, ToolCall};
pub use request::{CompletionOptions, CompletionRequest, ModelDescriptor, ResponseFormat, VendorRequest};
pub use result::{CompletionResult, FinishReason, Usage};
pub use tool::{GenericTool, ToolKind};
pub use vendor::Vendor;
