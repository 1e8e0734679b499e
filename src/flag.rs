//! Flag enums backed by a small unsigned integer.
//!
//! Both [`Type`](crate::Type) and [`Kind`](crate::Kind) are bitsets whose atomic
//! bits are declared in a fixed order. Matching uses an existential rule per
//! group: `has(subject, &[a | b, c])` reads "subject is a-or-b, and also c".

/// A bitset over a fixed, ordered list of atomic flags.
pub trait Flags: Copy + Eq + 'static {
    /// The atomic flags in declaration order.
    const ATOMS: &'static [Self];

    fn bits(self) -> u8;
}

/// Returns true iff, for every group, `subject` shares at least one atomic bit
/// with that group.
///
/// This is not a subset test: `has(INTEGER, &[INTEGER | NUMBER])` is true.
/// An empty group list is vacuously satisfied; an empty group never is.
pub fn has<F: Flags>(subject: F, groups: &[F]) -> bool {
    groups.iter().all(|group| {
        range(*group).any(|atom| subject.bits() & atom.bits() == atom.bits())
    })
}

/// Yields the atomic flags set in `flags`, in declaration order.
pub fn range<F: Flags>(flags: F) -> impl Iterator<Item = F> {
    F::ATOMS
        .iter()
        .copied()
        .filter(move |atom| flags.bits() & atom.bits() == atom.bits())
}

/// Declares a `u8` newtype bitset with `|`, `&`, `!`, and [`Flags`].
macro_rules! flag_set {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $( $(#[$atom_meta:meta])* const $atom:ident = $bit:expr; )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
        pub struct $name(u8);

        impl $name {
            $( $(#[$atom_meta])* pub const $atom: $name = $name(1 << $bit); )+

            /// The zero value: no bit set.
            pub const EMPTY: $name = $name(0);

            pub const fn from_bits(bits: u8) -> Self {
                $name(bits)
            }

            pub const fn bits(self) -> u8 {
                self.0
            }

            pub const fn is_empty(self) -> bool {
                self.0 == 0
            }

            /// See [`flag::has`](crate::flag::has).
            pub fn has(self, groups: &[$name]) -> bool {
                $crate::flag::has(self, groups)
            }

            /// See [`flag::range`](crate::flag::range).
            pub fn range(self) -> impl Iterator<Item = $name> {
                $crate::flag::range(self)
            }
        }

        impl $crate::flag::Flags for $name {
            const ATOMS: &'static [Self] = &[$($name::$atom),+];

            fn bits(self) -> u8 {
                self.0
            }
        }

        impl std::ops::BitOr for $name {
            type Output = $name;
            fn bitor(self, rhs: $name) -> $name {
                $name(self.0 | rhs.0)
            }
        }

        impl std::ops::BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: $name) {
                self.0 |= rhs.0;
            }
        }

        impl std::ops::BitAnd for $name {
            type Output = $name;
            fn bitand(self, rhs: $name) -> $name {
                $name(self.0 & rhs.0)
            }
        }

        impl std::ops::Not for $name {
            type Output = $name;
            fn not(self) -> $name {
                let all = 0 $(| (1u8 << $bit))+;
                $name(!self.0 & all)
            }
        }
    };
}

pub(crate) use flag_set;

#[cfg(test)]
mod tests {
    use super::*;

    flag_set! {
        #[derive(Debug)]
        pub struct Color {
            const RED = 0;
            const GREEN = 1;
            const BLUE = 2;
        }
    }

    #[test]
    fn has_is_existential_within_a_group() {
        assert!(Color::RED.has(&[Color::RED | Color::BLUE]));
        assert!(!Color::GREEN.has(&[Color::RED | Color::BLUE]));
    }

    #[test]
    fn has_is_conjunctive_across_groups() {
        let purple = Color::RED | Color::BLUE;
        assert!(purple.has(&[Color::RED, Color::BLUE]));
        assert!(!purple.has(&[Color::RED, Color::GREEN]));
    }

    #[test]
    fn has_edge_cases() {
        assert!(Color::RED.has(&[]));
        assert!(!Color::RED.has(&[Color::EMPTY]));
        assert!(!Color::EMPTY.has(&[Color::RED | Color::GREEN | Color::BLUE]));
    }

    #[test]
    fn range_follows_declaration_order() {
        let all = Color::BLUE | Color::RED | Color::GREEN;
        let atoms: Vec<_> = all.range().collect();
        assert_eq!(atoms, vec![Color::RED, Color::GREEN, Color::BLUE]);
        assert_eq!(Color::EMPTY.range().count(), 0);
    }

    #[test]
    fn not_stays_within_declared_bits() {
        assert_eq!(!Color::RED, Color::GREEN | Color::BLUE);
        assert_eq!((!Color::EMPTY).bits(), 0b111);
    }
}
