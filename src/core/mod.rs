pub mod gesture;
pub mod input_adapter;
pub mod interaction;
pub mod timer;
pub mod tooltip;

pub use gesture::{classify_pointer_down, classify_wheel, GestureContext, GestureMode, WheelAction};
pub use input_adapter::WinitPointer;
pub use interaction::{CommitReason, InteractionMachine, Outcome, Session};
pub use timer::Debounce;
pub use tooltip::{Tooltip, TooltipPresenter};
