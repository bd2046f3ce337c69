/// Ordered instructor roster used for assignment at booking creation.
///
/// Assignment is the requester's own upcoming-booking count modulo the
/// roster length. It only considers that one user's bookings, so it is a
/// per-user rotation rather than a load balancer across instructors.
#[derive(Debug, Clone)]
pub struct InstructorRoster {
    names: Vec<String>,
}

impl InstructorRoster {
    /// Build a roster from configuration. An empty list falls back to the
    /// built-in default so assignment always has a candidate.
    pub fn new(names: Vec<String>) -> Self {
        if names.is_empty() {
            Self::default()
        } else {
            Self { names }
        }
    }

    pub fn default_names() -> Vec<String> {
        [
            "Asha Gurung",
            "Bibek Sharma",
            "Chandra Thapa",
            "Dolma Lama",
            "Elina Shrestha",
            "Firoz Karki",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    pub fn assign(&self, upcoming_count: u64) -> &str {
        let idx = (upcoming_count % self.names.len() as u64) as usize;
        &self.names[idx]
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for InstructorRoster {
    fn default() -> Self {
        Self {
            names: Self::default_names(),
        }
    }
}
