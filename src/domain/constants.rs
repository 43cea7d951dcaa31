/// Applications whose macro-access gate this tool may toggle.
pub const CONTROLLED_APPLICATIONS: [&str; 2] = ["Word", "Excel"];

/// Application marker used when the owning app cannot be determined from
/// registry context (the legacy MRU list does not embed it).
pub const GENERIC_APPLICATION: &str = "Office";

pub const OFFICE_ROOT: &str = "Software\\Microsoft\\Office";

/// Gate value controlling automated access to a document's macro project.
pub const ACCESS_VBOM_VALUE: &str = "AccessVBOM";
pub const VBOM_PERMIT: u32 = 1;

/// Office version namespaces that can carry the gate (7.0 through 16.0).
pub const OFFICE_VERSIONS: std::ops::RangeInclusive<u32> = 7..=16;

pub const DEFAULT_WINDOW_DAYS: u32 = 7;
/// Window used in unfiltered (`--full`) mode when no explicit override is given.
pub const FULL_WINDOW_DAYS: u32 = 30;

pub const WORD_MACRO_EXTENSIONS: [&str; 6] = [".doc", ".dot", ".dotx", ".dotm", ".docm", ".docb"];
pub const EXCEL_MACRO_EXTENSIONS: [&str; 6] = [".xls", ".xlt", ".xltx", ".xltm", ".xlsm", ".xlsb"];
