use std::fmt;

/// A value that can be carried as an event field.
///
/// Every field on the wire is text, so this is implemented for all types
/// that implement `Display`: messages and additional field values are
/// coerced with their `Display` rendering.
pub trait Loggable {
    /// Renders self as the text stored in the event.
    fn to_field(&self) -> String;
}

impl<T> Loggable for T
where
    T: fmt::Display + ?Sized,
{
    fn to_field(&self) -> String {
        self.to_string()
    }
}
