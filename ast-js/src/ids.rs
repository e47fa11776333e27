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

id_newtype!(StmtId);
id_newtype!(ExprId);
id_newtype!(FuncId);
