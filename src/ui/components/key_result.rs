/// Outcome of offering a key to a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult<T> {
  /// Consumed with nothing to report
  Handled,
  /// Consumed, and the owner should act on `T`
  Event(T),
  /// Not for this component; offer it to the next handler
  NotHandled,
}
