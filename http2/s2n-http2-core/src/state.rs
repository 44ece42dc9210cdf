// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Small state machine toolkit used by the stream state enums
//!
//! The `event!` macro expands a transition table into one method per event.
//! Invalid transitions are reported as errors rather than panics so callers
//! can translate them into protocol errors.

use core::fmt;

pub type Result<T> = core::result::Result<(), Error<T>>;

#[cfg(feature = "state-tracing")]
#[doc(hidden)]
pub use tracing::debug as _debug;

#[cfg(not(feature = "state-tracing"))]
#[macro_export]
#[doc(hidden)]
macro_rules! __tracing_noop__ {
    ($($fields:tt)*) => {};
}

#[cfg(not(feature = "state-tracing"))]
#[doc(hidden)]
pub use crate::__tracing_noop__ as _debug;

#[macro_export]
#[doc(hidden)]
macro_rules! __state_event__ {
    (
        $(#[doc = $doc:literal])*
        $event:ident (
            $(
                $($valid:ident)|* => $target:ident
            ),*
            $(,)?
        )
    ) => {
        $(
            #[doc = $doc]
        )*
        #[inline]
        pub fn $event(&mut self) -> $crate::state::Result<Self> {
            match self {
                $(
                    $(Self::$valid)|* => {
                        let next = Self::$target;
                        $crate::state::_debug!(event = stringify!($event), prev = ?self, next = ?next);
                        *self = next;
                        Ok(())
                    }
                )*
                _ => {
                    let current = self.clone();

                    // an event whose only destination is where the machine
                    // already sits is a repeat delivery, not a violation
                    let destinations = [$(Self::$target),*];
                    if let [only] = &destinations[..] {
                        if *only == current {
                            return Err($crate::state::Error::Unchanged { current });
                        }
                    }

                    Err($crate::state::Error::Rejected {
                        current,
                        event: stringify!($event),
                    })
                }
            }
        }
    };
    ($(
        $(#[doc = $doc:literal])*
        $event:ident (
            $(
                $($valid:ident)|* => $target:ident
            ),*
            $(,)?
        );
    )*) => {
        $(
            $crate::state::event!(
                $(#[doc = $doc])*
                $event($($($valid)|* => $target),*)
            );
        )*
    }
}

pub use crate::__state_event__ as event;

// Expands a membership test over one or more states into a predicate
// method.
#[macro_export]
#[doc(hidden)]
macro_rules! __state_is__ {
    ($(#[doc = $doc:literal])* $function:ident, $($state:ident)|+) => {
        $(
            #[doc = $doc]
        )*
        #[inline]
        pub fn $function(&self) -> bool {
            match self {
                $(Self::$state)|+ => true,
                #[allow(unreachable_patterns)]
                _ => false,
            }
        }
    };
}

pub use crate::__state_is__ as is;

/// Why an event was not applied
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error<T> {
    /// The event targets the state the machine already reached
    Unchanged { current: T },
    /// The event is not defined for the current state
    Rejected { current: T, event: &'static str },
}

impl<T> Error<T> {
    /// Returns true if the event would have left the state unchanged
    #[inline]
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged { .. })
    }
}

impl<T: fmt::Debug> fmt::Display for Error<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unchanged { current } => {
                write!(f, "the state machine already reached {current:?}")
            }
            Self::Rejected { current, event } => {
                write!(f, "event {event:?} is not defined for state {current:?}")
            }
        }
    }
}

#[cfg(feature = "std")]
impl<T: fmt::Debug> std::error::Error for Error<T> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, Default, PartialEq, Eq)]
    enum Light {
        #[default]
        Red,
        Yellow,
        Green,
    }

    impl Light {
        is!(is_red, Red);
        is!(is_stoppable, Red | Yellow);

        event! {
            on_go(Red => Green);
            on_slow(Green => Yellow);
            on_stop(Yellow | Green => Red);
        }
    }

    #[test]
    fn transitions() {
        let mut light = Light::default();
        assert!(light.is_red());
        assert!(light.on_go().is_ok());
        assert!(!light.is_stoppable() || light.is_red());
        assert!(light.on_slow().is_ok());
        assert_eq!(light, Light::Yellow);
        assert!(light.on_stop().is_ok());
        assert!(light.is_red());
    }

    #[test]
    fn rejected_transition() {
        let mut light = Light::Red;
        assert_eq!(
            light.on_slow(),
            Err(Error::Rejected {
                current: Light::Red,
                event: "on_slow",
            })
        );
    }

    #[test]
    fn repeated_transition_is_unchanged() {
        let mut light = Light::Green;
        assert_eq!(
            light.on_go(),
            Err(Error::Unchanged {
                current: Light::Green
            })
        );
        assert!(light.on_go().unwrap_err().is_unchanged());
    }
}
