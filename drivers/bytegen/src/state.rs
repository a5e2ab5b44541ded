use core::fmt;

/// Where the module is in its lifetime. Only used for diagnostics, callers
/// never see anything but `Loaded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Unloaded,
    Allocating,
    ClassReady,
    BindingReady,
    NodesReady(u32),
    Loaded,
    Unloading,
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unloaded => f.write_str("unloaded"),
            Self::Allocating => f.write_str("allocating"),
            Self::ClassReady => f.write_str("class ready"),
            Self::BindingReady => f.write_str("binding ready"),
            Self::NodesReady(n) => write!(f, "{n} nodes ready"),
            Self::Loaded => f.write_str("loaded"),
            Self::Unloading => f.write_str("unloading"),
        }
    }
}
