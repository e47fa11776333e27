macro_rules! id_newtype {
  ($name:ident) => {
    #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
    pub struct $name(pub u32);

    impl $name {
      pub fn index(self) -> usize {
        self.0 as usize
      }
    }

    impl From<u32> for $name {
      fn from(value: u32) -> Self {
        Self(value)
      }
    }
  };
}

/// Handle into the registry arena. Handle equality is type identity, which
/// the registry guarantees coincides with semantic equality for everything
/// except named placeholders (those compare through their referent).
id_newtype!(TypeId);
