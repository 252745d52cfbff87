use crate::track::Track;

/// Structural changes sent from the control thread to the audio thread.
///
/// Drained at the top of every callback, in send order.
pub(crate) enum GraphCommand {
    /// Put a freshly built track into its slot and start recording.
    InsertTrack(Box<Track>),
    /// Take the track out of a slot and send it back for deallocation.
    RemoveTrack(usize),
}
