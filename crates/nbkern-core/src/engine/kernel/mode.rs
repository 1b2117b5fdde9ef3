/// Whether a kernel variant accumulates potential energies besides forces.
pub trait OutputMode: 'static {
    const ENERGY: bool;
    const TAG: &'static str;
}

/// Forces only.
pub struct ForceOnly;

/// Forces and potential energies.
pub struct ForceAndEnergy;

impl OutputMode for ForceOnly {
    const ENERGY: bool = false;
    const TAG: &'static str = "F";
}

impl OutputMode for ForceAndEnergy {
    const ENERGY: bool = true;
    const TAG: &'static str = "VF";
}

pub fn tag(energy: bool) -> &'static str {
    if energy {
        ForceAndEnergy::TAG
    } else {
        ForceOnly::TAG
    }
}
