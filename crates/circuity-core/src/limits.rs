//! Input validation limits for resource protection

/// Maximum steps a single try may take (10000)
pub const MAX_STEP_LIMIT: usize = 10_000;

/// Maximum verification steps within one try (1000)
pub const MAX_VERIFY_CEILING: usize = 1_000;

/// Maximum retry budget for a single search (100)
pub const MAX_TRIES: usize = 100;

/// Maximum origin addresses in one request (64)
pub const MAX_ORIGINS: usize = 64;

/// Maximum length for a node address (1024 bytes)
pub const MAX_ADDRESS_LEN: usize = 1024;

/// Validation error type
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    StepLimitTooLarge { limit: usize, max: usize },
    ZeroStepLimit,
    VerifyCeilingTooLarge { ceiling: usize, max: usize },
    ZeroVerifyCeiling,
    TooManyTries { tries: usize, max: usize },
    TooManyOrigins { count: usize, max: usize },
    NoOrigins,
    EmptyAddress,
    AddressTooLong { len: usize, max: usize },
    InvalidLabel(String),
    InvalidWeight(f64),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StepLimitTooLarge { limit, max } => {
                write!(f, "Step limit too large: {} (max {})", limit, max)
            }
            Self::ZeroStepLimit => write!(f, "Step limit must be at least 1"),
            Self::VerifyCeilingTooLarge { ceiling, max } => {
                write!(f, "Verify ceiling too large: {} (max {})", ceiling, max)
            }
            Self::ZeroVerifyCeiling => write!(f, "Verify ceiling must be at least 1"),
            Self::TooManyTries { tries, max } => {
                write!(f, "Too many tries: {} (max {})", tries, max)
            }
            Self::TooManyOrigins { count, max } => {
                write!(f, "Too many origin addresses: {} (max {})", count, max)
            }
            Self::NoOrigins => write!(f, "At least one origin address is required"),
            Self::EmptyAddress => write!(f, "Node address cannot be empty"),
            Self::AddressTooLong { len, max } => {
                write!(f, "Node address too long: {} bytes (max {})", len, max)
            }
            Self::InvalidWeight(weight) => {
                write!(f, "Edge weight must be finite and non-negative, got {}", weight)
            }
            Self::InvalidLabel(label) => {
                write!(f, "Label must be exactly one character, got '{}'", label)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate a per-try step limit
pub fn validate_step_limit(limit: usize) -> Result<(), ValidationError> {
    if limit == 0 {
        return Err(ValidationError::ZeroStepLimit);
    }
    if limit > MAX_STEP_LIMIT {
        return Err(ValidationError::StepLimitTooLarge {
            limit,
            max: MAX_STEP_LIMIT,
        });
    }
    Ok(())
}

/// Validate the verification ceiling
pub fn validate_verify_ceiling(ceiling: usize) -> Result<(), ValidationError> {
    if ceiling == 0 {
        return Err(ValidationError::ZeroVerifyCeiling);
    }
    if ceiling > MAX_VERIFY_CEILING {
        return Err(ValidationError::VerifyCeilingTooLarge {
            ceiling,
            max: MAX_VERIFY_CEILING,
        });
    }
    Ok(())
}

/// Validate a retry budget
pub fn validate_tries(tries: usize) -> Result<(), ValidationError> {
    if tries > MAX_TRIES {
        return Err(ValidationError::TooManyTries {
            tries,
            max: MAX_TRIES,
        });
    }
    Ok(())
}

/// Validate a node address
pub fn validate_address(address: &str) -> Result<(), ValidationError> {
    if address.is_empty() {
        return Err(ValidationError::EmptyAddress);
    }
    if address.len() > MAX_ADDRESS_LEN {
        return Err(ValidationError::AddressTooLong {
            len: address.len(),
            max: MAX_ADDRESS_LEN,
        });
    }
    Ok(())
}

/// Validate the origin list of a request
pub fn validate_origins(origins: &[String]) -> Result<(), ValidationError> {
    if origins.is_empty() {
        return Err(ValidationError::NoOrigins);
    }
    if origins.len() > MAX_ORIGINS {
        return Err(ValidationError::TooManyOrigins {
            count: origins.len(),
            max: MAX_ORIGINS,
        });
    }
    origins.iter().try_for_each(|o| validate_address(o))
}

/// Validate an edge weight
pub fn validate_weight(weight: f64) -> Result<(), ValidationError> {
    if !weight.is_finite() || weight < 0.0 {
        return Err(ValidationError::InvalidWeight(weight));
    }
    Ok(())
}

/// Parse a label argument, which must be exactly one character
pub fn parse_label(raw: &str) -> Result<char, ValidationError> {
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(label), None) => Ok(label),
        _ => Err(ValidationError::InvalidLabel(raw.to_string())),
    }
}
