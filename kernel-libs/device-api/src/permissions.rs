use core::fmt;

bitflags::bitflags! {
    /// The `rwxrwxrwx` part of a node's mode.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Permissions: u16 {
        const OWNER_READ = 0o400;
        const OWNER_WRITE = 0o200;
        const OWNER_EXEC = 0o100;
        const GROUP_READ = 0o040;
        const GROUP_WRITE = 0o020;
        const GROUP_EXEC = 0o010;
        const OTHER_READ = 0o004;
        const OTHER_WRITE = 0o002;
        const OTHER_EXEC = 0o001;

        const READ_ALL = Self::OWNER_READ.bits() | Self::GROUP_READ.bits() | Self::OTHER_READ.bits();
    }
}

impl Permissions {
    pub const fn from_mode(mode: u16) -> Self {
        Self::from_bits_truncate(mode)
    }

    pub const fn mode(self) -> u16 {
        self.bits()
    }

    /// Applies a creation mask, the way a process umask trims a requested mode.
    pub const fn masked(self, umask: Permissions) -> Self {
        self.difference(umask)
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const SYMBOLS: [char; 3] = ['r', 'w', 'x'];
        for shift in (0..9).rev() {
            let symbol = if self.bits() & (1 << shift) != 0 {
                SYMBOLS[2 - shift % 3]
            } else {
                '-'
            };
            fmt::Write::write_char(f, symbol)?;
        }
        Ok(())
    }
}
