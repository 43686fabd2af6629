pub mod capture;
pub mod channel;
pub mod handoff;
pub mod window;

pub use capture::{AudioCapture, CaptureLoop, WavFileCapture};
pub use channel::ChannelExtractor;
pub use handoff::{activation_signal, ActivationListener, ActivationSignal, AudioHandoff, TakenChunk};
pub use window::SlidingWindow;
