//! Definition of the [`Role`] structure.

use std::fmt;
use std::ops::Not;

use rand::distributions::{Distribution, Standard};
use rand::Rng;

/// Enumeration of the two roles a device can play during a round : throwing balls or catching them.
///
/// The [`Not`] trait is implemented to get the complementary role using `!r` syntax. Both devices always hold
/// complementary roles.
///
/// Its wire encoding, a single bit of a role claim, lives in [`crate::protocol`].
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum Role {
    Catcher,
    Shooter,
}

impl Not for Role {
    type Output = Role;
    fn not(self) -> Self::Output {
        match self {
            Self::Catcher => Self::Shooter,
            Self::Shooter => Self::Catcher,
        }
    }
}

impl Distribution<Role> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Role {
        match rng.gen() {
            true => Role::Catcher,
            false => Role::Shooter,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Catcher => write!(f, "catcher"),
            Self::Shooter => write!(f, "shooter"),
        }
    }
}
