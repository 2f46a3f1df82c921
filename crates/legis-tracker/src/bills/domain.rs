use std::fmt;

/// Composite identity of a bill: the parliamentary session plus the formatted
/// bill number (`44-1` / `C-11`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BillKey {
    pub session: String,
    pub bill_id: String,
}

impl BillKey {
    pub fn new(session: impl Into<String>, bill_id: impl Into<String>) -> Self {
        Self {
            session: session.into(),
            bill_id: bill_id.into(),
        }
    }

    /// Parliament number the session belongs to (`44-1` -> 44).
    pub fn parliament(&self) -> Option<u32> {
        super::parliament::parliament_of(&self.session)
    }
}

impl fmt::Display for BillKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.session, self.bill_id)
    }
}

/// Legislative stage of a bill. `RoyalAssent` and `Defeated` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BillStage {
    FirstReading,
    SecondReading,
    Committee,
    ReportStage,
    ThirdReading,
    PassedOriginatingChamber,
    SenateStages,
    RoyalAssent,
    Defeated,
    /// Never produced by stage detection; kept so stored `UNKNOWN` codes load.
    Unknown,
}

impl BillStage {
    pub const fn ordered() -> [Self; 10] {
        [
            Self::FirstReading,
            Self::SecondReading,
            Self::Committee,
            Self::ReportStage,
            Self::ThirdReading,
            Self::PassedOriginatingChamber,
            Self::SenateStages,
            Self::RoyalAssent,
            Self::Defeated,
            Self::Unknown,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::FirstReading => "First Reading",
            Self::SecondReading => "Second Reading",
            Self::Committee => "Committee",
            Self::ReportStage => "Report Stage",
            Self::ThirdReading => "Third Reading",
            Self::PassedOriginatingChamber => "Passed Originating Chamber",
            Self::SenateStages => "Senate Stages",
            Self::RoyalAssent => "Royal Assent",
            Self::Defeated => "Defeated",
            Self::Unknown => "Unknown",
        }
    }

    /// Persisted code. Part of the stored document schema; never rename.
    pub const fn code(self) -> &'static str {
        match self {
            Self::FirstReading => "FIRST_READING",
            Self::SecondReading => "SECOND_READING",
            Self::Committee => "COMMITTEE",
            Self::ReportStage => "REPORT_STAGE",
            Self::ThirdReading => "THIRD_READING",
            Self::PassedOriginatingChamber => "PASSED_ORIGINATING_CHAMBER",
            Self::SenateStages => "SENATE_STAGES",
            Self::RoyalAssent => "ROYAL_ASSENT",
            Self::Defeated => "DEFEATED",
            Self::Unknown => "UNKNOWN",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ordered().into_iter().find(|stage| stage.code() == code)
    }
}

/// Chamber a bill currently sits in, as reported by the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Chamber {
    HouseOfCommons,
    Senate,
    Unknown,
}

impl Chamber {
    pub const fn label(self) -> &'static str {
        match self {
            Self::HouseOfCommons => "House of Commons",
            Self::Senate => "Senate",
            Self::Unknown => "Unknown",
        }
    }

    /// Feed chamber identifiers: 1 is the House of Commons, 2 the Senate.
    pub fn from_feed_id(id: &str) -> Option<Self> {
        match id.trim() {
            "1" => Some(Self::HouseOfCommons),
            "2" => Some(Self::Senate),
            _ => None,
        }
    }

    /// Lenient match on free-text chamber names.
    pub fn from_name(name: &str) -> Self {
        let lowered = name.to_lowercase();
        if lowered.contains("senate") {
            Self::Senate
        } else if lowered.contains("house") || lowered.contains("commons") {
            Self::HouseOfCommons
        } else {
            Self::Unknown
        }
    }

    /// Strict inverse of [`Chamber::label`], used when reading stored documents.
    pub fn from_label(label: &str) -> Option<Self> {
        [Self::HouseOfCommons, Self::Senate, Self::Unknown]
            .into_iter()
            .find(|chamber| chamber.label() == label)
    }
}

/// Coming-into-force classification of an enacted bill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CifStatus {
    #[default]
    NotDetermined,
    ActiveOnAssent,
    WaitingForOrder,
    FixedDate,
}

impl CifStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::NotDetermined => "Not Yet Determined",
            Self::ActiveOnAssent => "In Force on Royal Assent",
            Self::WaitingForOrder => "Awaiting Order in Council",
            Self::FixedDate => "Fixed Date",
        }
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::NotDetermined => "NOT_DETERMINED",
            Self::ActiveOnAssent => "ACTIVE_ON_ASSENT",
            Self::WaitingForOrder => "WAITING_FOR_ORDER",
            Self::FixedDate => "FIXED_DATE",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        [
            Self::NotDetermined,
            Self::ActiveOnAssent,
            Self::WaitingForOrder,
            Self::FixedDate,
        ]
        .into_iter()
        .find(|status| status.code() == code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BillOrigin {
    GovernmentHouse,
    PrivateMember,
    Senate,
    Unknown,
}

impl BillOrigin {
    pub const fn label(self) -> &'static str {
        match self {
            Self::GovernmentHouse => "Government Bill (House)",
            Self::PrivateMember => "Private Member's Bill",
            Self::Senate => "Senate Bill",
            Self::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BillForm {
    Amending,
    NewAct,
}

impl BillForm {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Amending => "Amending",
            Self::NewAct => "New Act",
        }
    }
}

/// Derived bill category, e.g. "Government Bill (House) - Amending".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BillCategory {
    pub origin: BillOrigin,
    pub form: Option<BillForm>,
}

impl BillCategory {
    pub fn label(&self) -> String {
        match self.form {
            Some(form) => format!("{} - {}", self.origin.label(), form.label()),
            None => self.origin.label().to_string(),
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let (origin_label, form) = match label.rsplit_once(" - ") {
            Some((origin, suffix)) => {
                let form = [BillForm::Amending, BillForm::NewAct]
                    .into_iter()
                    .find(|form| form.label() == suffix)?;
                (origin, Some(form))
            }
            None => (label, None),
        };

        let origin = [
            BillOrigin::GovernmentHouse,
            BillOrigin::PrivateMember,
            BillOrigin::Senate,
            BillOrigin::Unknown,
        ]
        .into_iter()
        .find(|origin| origin.label() == origin_label)?;

        Some(Self { origin, form })
    }
}

impl fmt::Display for BillCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Classifies a bill from its identifier and title.
///
/// House bills numbered below 201 are government bills, the rest private
/// members' bills; `S-` bills originate in the Senate. Identifiers that do not
/// parse yield `Unknown` with no title sub-classification.
pub fn classify(bill_id: &str, title: &str) -> BillCategory {
    let origin = match parse_identifier(bill_id) {
        Some(('C', number)) if number < 201 => BillOrigin::GovernmentHouse,
        Some(('C', _)) => BillOrigin::PrivateMember,
        Some(('S', _)) => BillOrigin::Senate,
        _ => {
            return BillCategory {
                origin: BillOrigin::Unknown,
                form: None,
            }
        }
    };

    let lowered = title.to_lowercase();
    let form = if lowered.contains("act to amend") {
        Some(BillForm::Amending)
    } else if lowered.contains("act respecting") {
        Some(BillForm::NewAct)
    } else {
        None
    };

    BillCategory { origin, form }
}

fn parse_identifier(bill_id: &str) -> Option<(char, u32)> {
    let trimmed = bill_id.trim();
    let mut chars = trimmed.chars();
    let prefix = chars.next()?.to_ascii_uppercase();
    if prefix != 'C' && prefix != 'S' {
        return None;
    }

    let rest = chars.as_str();
    let rest = rest.strip_prefix('-').unwrap_or(rest);
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok().map(|number| (prefix, number))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_origin_and_title() {
        assert_eq!(
            classify("C-11", "An Act to amend the Broadcasting Act").label(),
            "Government Bill (House) - Amending"
        );
        assert_eq!(
            classify("C-234", "An Act respecting farm heating").label(),
            "Private Member's Bill - New Act"
        );
        assert_eq!(
            classify("S-5", "An Act respecting X").label(),
            "Senate Bill - New Act"
        );
        assert_eq!(classify("C-200", "Budget Implementation").label(), "Government Bill (House)");
        assert_eq!(classify("C-201", "Something").label(), "Private Member's Bill");
    }

    #[test]
    fn accepts_lowercase_and_missing_separator() {
        assert_eq!(classify("c12", "").origin, BillOrigin::GovernmentHouse);
        assert_eq!(classify("s-1001", "").origin, BillOrigin::Senate);
    }

    #[test]
    fn unparseable_identifiers_are_unknown_without_suffix() {
        let category = classify("M-103", "An Act to amend something");
        assert_eq!(category.origin, BillOrigin::Unknown);
        assert_eq!(category.form, None);
        assert_eq!(classify("C-", "").origin, BillOrigin::Unknown);
        assert_eq!(classify("", "").label(), "Unknown");
    }

    #[test]
    fn amending_wins_over_new_act() {
        let category = classify("C-3", "An Act to amend the Act respecting ports");
        assert_eq!(category.form, Some(BillForm::Amending));
    }

    #[test]
    fn category_labels_parse_back() {
        for label in [
            "Government Bill (House) - Amending",
            "Private Member's Bill",
            "Senate Bill - New Act",
            "Unknown",
        ] {
            let category = BillCategory::from_label(label).expect("known label");
            assert_eq!(category.label(), label);
        }
        assert!(BillCategory::from_label("Amending Bill").is_none());
        assert!(BillCategory::from_label("Senate Bill - Repealing").is_none());
    }

    #[test]
    fn stage_codes_are_a_closed_mapping() {
        for stage in BillStage::ordered() {
            assert_eq!(BillStage::from_code(stage.code()), Some(stage));
        }
        assert_eq!(BillStage::from_code("UNKNOWN"), Some(BillStage::Unknown));
        assert_eq!(BillStage::from_code("PASSED_HOUSE"), None);
        assert_eq!(CifStatus::from_code("FIXED_DATE"), Some(CifStatus::FixedDate));
        assert_eq!(CifStatus::from_code("fixed_date"), None);
    }

    #[test]
    fn chamber_resolution() {
        assert_eq!(Chamber::from_feed_id("1"), Some(Chamber::HouseOfCommons));
        assert_eq!(Chamber::from_feed_id("2"), Some(Chamber::Senate));
        assert_eq!(Chamber::from_feed_id("3"), None);
        assert_eq!(Chamber::from_name("the Senate of Canada"), Chamber::Senate);
        assert_eq!(Chamber::from_name("House of Commons"), Chamber::HouseOfCommons);
        assert_eq!(Chamber::from_name("Joint committee"), Chamber::Unknown);
        assert_eq!(Chamber::from_label("Senate"), Some(Chamber::Senate));
        assert_eq!(Chamber::from_label("senate"), None);
    }

    #[test]
    fn key_renders_session_and_number() {
        let key = BillKey::new("44-1", "C-11");
        assert_eq!(key.to_string(), "44-1-C-11");
        assert_eq!(key.parliament(), Some(44));
    }
}
