//! The byte channel between the two devices, as seen by the game.

/// A half-duplex, lossy, unacknowledged byte channel to the other device.
///
/// Implementations never block : [`SerialLink::try_receive`] returns [`None`] when nothing is queued, and
/// [`SerialLink::send`] drops the byte if it cannot be sent right away. There are no delivery guarantees.
pub trait SerialLink {
    fn send(&mut self, byte: u8);

    fn try_receive(&mut self) -> Option<u8>;

    /// Drain and discard every byte already queued. Returns how many were discarded.
    fn flush_input(&mut self) -> usize {
        let mut discarded = 0;
        while self.try_receive().is_some() {
            discarded += 1;
        }
        discarded
    }
}
