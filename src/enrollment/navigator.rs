//! Step navigator for the five-step enrollment form.
//!
//! Navigation never looks at form validity; callers gate on that themselves.
pub const TOTAL_STEPS: u8 = 5;

const STEP_TITLES: [&str; TOTAL_STEPS as usize] = [
    "Personal Information",
    "Farm Profile",
    "Farm Parcels",
    "Livelihood Activities",
    "Review & Submit",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepNavigator {
    current: u8,
}

impl StepNavigator {
    pub fn new() -> Self {
        Self { current: 1 }
    }

    /// Restore a persisted step, falling back to step 1 when out of range.
    pub fn at(step: u8) -> Self {
        let mut navigator = Self::new();
        navigator.go_to(step);
        navigator
    }

    pub fn current(&self) -> u8 {
        self.current
    }

    pub fn total(&self) -> u8 {
        TOTAL_STEPS
    }

    pub fn title(&self) -> &'static str {
        STEP_TITLES[usize::from(self.current - 1)]
    }

    pub fn is_first(&self) -> bool {
        self.current == 1
    }

    pub fn is_last(&self) -> bool {
        self.current == TOTAL_STEPS
    }

    /// Advance one step; returns whether the step changed.
    pub fn next(&mut self) -> bool {
        if self.current < TOTAL_STEPS {
            self.current += 1;
            return true;
        }
        false
    }

    pub fn prev(&mut self) -> bool {
        if self.current > 1 {
            self.current -= 1;
            return true;
        }
        false
    }

    /// Jump directly; out-of-range targets are ignored.
    pub fn go_to(&mut self, step: u8) -> bool {
        if (1..=TOTAL_STEPS).contains(&step) {
            self.current = step;
            return true;
        }
        false
    }
}

impl Default for StepNavigator {
    fn default() -> Self {
        Self::new()
    }
}
