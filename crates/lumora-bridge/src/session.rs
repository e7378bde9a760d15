use lumora_render::BindingId;

/// Where the bridge is in its GPU session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Session {
    /// No surface bound yet, or the surface is gone
    Dormant,
    /// A device and a valid binding exist
    Active {
        device_generation: u64,
        binding: BindingId,
    },
    /// The device was lost and is being replaced
    Reinitializing { attempt: u32 },
    /// Terminal; every GPU resource has been released
    Stopped,
}

impl Session {
    pub fn is_active(&self) -> bool {
        matches!(self, Session::Active { .. })
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, Session::Stopped)
    }
}
