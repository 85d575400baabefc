use std::fmt::Formatter;

use thiserror::Error;

/// An error or diagnostic tied to a particular operation ordinal within a
/// traced call.
///
/// Recording observes the oracle as a sequence of intercepted operations;
/// the `step` is the zero-based position of the operation during which the
/// payload was produced.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub struct Located<E>
where
    E: Clone,
{
    /// The zero-based ordinal of the intercepted operation.
    pub step: usize,

    /// The error data.
    pub payload: E,
}

/// Displays the payload together with the operation ordinal at which it was
/// produced.
impl<E> std::fmt::Display for Located<E>
where
    E: std::fmt::Display + Clone,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[step {}]: {}", self.step, self.payload)
    }
}

/// A trait for types that can have an operation ordinal attached to them.
pub trait Locatable
where
    Self: Sized,
{
    /// The return type with the attached operation ordinal.
    type Located;

    /// Attaches the operation ordinal described by `step` to the error.
    fn at_step(self, step: usize) -> Self::Located;
}

/// A blanket implementation that allows attaching a step to any result.
impl<T, E> Locatable for Result<T, E>
where
    E: std::error::Error + Clone,
{
    type Located = Result<T, Located<E>>;

    fn at_step(self, step: usize) -> Self::Located {
        self.map_err(|e| Located { step, payload: e })
    }
}

/// An error that is a collection of errors.
///
/// The errors are kept in the order in which they were added to the
/// container, which for recording diagnostics is the order in which the
/// corresponding operations were intercepted.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub struct Errors<E> {
    payloads: Vec<E>,
}

impl<E> Errors<E> {
    /// Creates a new container holding no errors.
    #[must_use]
    pub fn new() -> Self {
        let payloads = vec![];
        Self { payloads }
    }

    /// Gets the errors contained within this container.
    #[must_use]
    pub fn payloads(&self) -> &[E] {
        self.payloads.as_slice()
    }

    /// Gets the number of errors in the container.
    #[must_use]
    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    /// Checks if the container holds no errors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E> Errors<E>
where
    E: std::error::Error,
{
    /// Adds the provided `error` to the container.
    pub fn add(&mut self, error: E) {
        self.payloads.push(error);
    }

    /// Adds multiple errors to the container at once.
    pub fn add_many(&mut self, errors: impl Into<Vec<E>>) {
        self.payloads.extend(errors.into());
    }
}

/// The default container is one holding no errors.
impl<E> Default for Errors<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Allow conversion from any error type to a container of errors.
impl<E> From<E> for Errors<E>
where
    E: std::error::Error,
{
    fn from(value: E) -> Self {
        let mut errors = Self::default();
        errors.add(value);
        errors
    }
}

/// Allow conversion from the errors container to a vector of errors.
impl<E> From<Errors<E>> for Vec<E>
where
    E: std::error::Error,
{
    fn from(value: Errors<E>) -> Self {
        value.payloads
    }
}

/// Displays the errors in the order in which they occur in the container.
///
/// It has a header specifying how many errors occurred, followed by one
/// error per line.
impl<E> std::fmt::Display for Errors<E>
where
    E: std::fmt::Display,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.payloads.is_empty() {
            write!(f, "Encountered no errors")?;
        } else {
            writeln!(f, "Encountered {} errors:", self.payloads.len())?;
            for error in &self.payloads {
                writeln!(f, "{error}")?;
            }
        }

        Ok(())
    }
}
