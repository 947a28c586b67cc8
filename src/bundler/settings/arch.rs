//! CPU architecture classification for platform descriptors.

/// CPU architecture of a platform descriptor.
///
/// The build matrix carries architectures as free-form strings (`arch_type`)
/// and the manifest reproduces them verbatim. This type only classifies them
/// for decisions the pipeline has to make, such as which download flags to
/// send.
///
/// # Examples
///
/// ```
/// use distributor_packager::bundler::Arch;
///
/// assert_eq!(Arch::from_arch_type("arm64"), Arch::Arm64);
/// assert_eq!(Arch::from_arch_type("x64"), Arch::X64);
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Arch {
    /// x86_64 / AMD64
    X64,
    /// 32-bit x86
    X86,
    /// 64-bit ARM (Graviton, Apple Silicon)
    Arm64,
    /// Anything the pipeline has no special handling for
    Other(String),
}

impl Arch {
    /// Classifies an `arch_type` value from the build matrix.
    pub fn from_arch_type(arch_type: &str) -> Self {
        match arch_type.to_ascii_lowercase().as_str() {
            "x64" | "x86_64" | "amd64" => Self::X64,
            "x86" | "i386" | "i686" => Self::X86,
            "arm64" | "aarch64" => Self::Arm64,
            _ => Self::Other(arch_type.to_string()),
        }
    }

    /// Whether the download service needs its ARM packaging flag.
    pub fn is_arm64(&self) -> bool {
        matches!(self, Self::Arm64)
    }
}
