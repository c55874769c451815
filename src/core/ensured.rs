use serde::Serialize;

/// Outcome of an idempotent ensure-exists operation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "record", rename_all = "snake_case")]
pub enum Ensured<T> {
    /// The record did not exist and was created by this call
    Created(T),
    /// The record already existed and was returned unchanged
    Existing(T),
}

impl<T> Ensured<T> {
    pub fn was_created(&self) -> bool {
        matches!(self, Ensured::Created(_))
    }

    pub fn get(&self) -> &T {
        match self {
            Ensured::Created(value) | Ensured::Existing(value) => value,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Ensured::Created(value) | Ensured::Existing(value) => value,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Ensured<U> {
        match self {
            Ensured::Created(value) => Ensured::Created(f(value)),
            Ensured::Existing(value) => Ensured::Existing(f(value)),
        }
    }
}
