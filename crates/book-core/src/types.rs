/// Events flowing from the control input task into the foreground loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Force the projection to start, bypassing the detection cooldown
    ManualTrigger,
    ToggleRecognition,
    ShowStatus,
    Shutdown,
}
