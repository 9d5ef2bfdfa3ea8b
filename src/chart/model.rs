//! Individual / family graph
//!
//! Records live in an arena owned by [`Graph`] and refer to each other by id,
//! never by pointer. An individual points at the family it was born into and
//! the families it is a spouse in; a family points at its husband, wife and
//! children. None of these links own anything; the whole graph is dropped at
//! once when a conversion finishes.
//!
//! Text attributes have fixed capacities (see [`limits`]). Longer values are
//! truncated on write, never rejected.

use crate::chart::interning::{RecordId, XrefTable};
use crate::chart::token::bounded;
use serde::Serialize;
use std::fmt;

/// Character capacities of the text attributes.
pub mod limits {
    pub const NAME: usize = 63;
    pub const GIVEN_NAME: usize = 31;
    pub const SURNAME: usize = 31;
    pub const MARRIED_NAME: usize = 63;
    pub const NICKNAME: usize = 15;
    pub const SEX: usize = 3;
    pub const OCCUPATION: usize = 31;
    pub const DATE: usize = 15;
    pub const PLACE: usize = 31;
    pub const FILE: usize = 63;
}

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            /// The numeric id, starting at 1.
            pub fn get(self) -> u32 {
                self.0
            }
        }

        impl RecordId for $name {
            fn from_index(index: usize) -> Self {
                $name(index as u32 + 1)
            }

            fn index(self) -> usize {
                self.0 as usize - 1
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

record_id!(
    /// Id of an [`Individual`], unique within its interning table.
    IndividualId,
    "individual"
);
record_id!(
    /// Id of a [`Family`], unique within its interning table.
    FamilyId,
    "family"
);

/// A dated, placed life event. `occurred` is tracked on its own because a
/// death or marriage may be recorded with neither date nor place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Event {
    pub date: String,
    pub place: String,
    pub occurred: bool,
}

impl Event {
    pub fn set_date(&mut self, value: &str) {
        self.date = bounded(value, limits::DATE);
    }

    pub fn set_place(&mut self, value: &str) {
        self.place = bounded(value, limits::PLACE);
    }

    /// True when the event carries anything worth rendering.
    pub fn is_known(&self) -> bool {
        self.occurred || !self.date.is_empty() || !self.place.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sex {
    Male,
    Female,
    Unknown,
}

/// Placement of an individual's block on the chart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Position {
    pub column: u32,
    pub row: u32,
}

/// Resolved display name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NameParts {
    pub given: String,
    pub surname: String,
    pub nickname: String,
}

#[derive(Debug, Clone)]
pub struct Individual {
    pub id: IndividualId,
    pub xref: String,
    /// Set once the individual's own `INDI` record has been seen.
    pub declared: bool,
    pub name: String,
    pub given_name: String,
    pub surname: String,
    pub nickname: String,
    pub married_name: String,
    pub sex: String,
    pub occupation: String,
    pub birth: Event,
    pub death: Event,
    /// Declared number of children (`NCHI`), independent of linked children.
    pub child_count: u32,
    pub parent_family: Option<FamilyId>,
    pub spouse_families: Vec<FamilyId>,
    pub generation: u32,
    pub position: Position,
}

impl Individual {
    pub fn new(id: IndividualId, xref: &str) -> Self {
        Self {
            id,
            xref: xref.to_string(),
            declared: false,
            name: String::new(),
            given_name: String::new(),
            surname: String::new(),
            nickname: String::new(),
            married_name: String::new(),
            sex: String::new(),
            occupation: String::new(),
            birth: Event::default(),
            death: Event::default(),
            child_count: 0,
            parent_family: None,
            spouse_families: Vec::new(),
            generation: 0,
            position: Position::default(),
        }
    }

    pub fn set_name(&mut self, value: &str) {
        self.name = bounded(value, limits::NAME);
    }

    pub fn set_given_name(&mut self, value: &str) {
        self.given_name = bounded(value, limits::GIVEN_NAME);
    }

    pub fn set_surname(&mut self, value: &str) {
        self.surname = bounded(value, limits::SURNAME);
    }

    pub fn set_nickname(&mut self, value: &str) {
        self.nickname = bounded(value, limits::NICKNAME);
    }

    pub fn set_married_name(&mut self, value: &str) {
        self.married_name = bounded(value, limits::MARRIED_NAME);
    }

    pub fn set_sex(&mut self, value: &str) {
        self.sex = bounded(value, limits::SEX);
    }

    pub fn set_occupation(&mut self, value: &str) {
        self.occupation = bounded(value, limits::OCCUPATION);
    }

    /// Sex as used by marriage alignment: only the first letter counts.
    pub fn sex(&self) -> Sex {
        match self.sex.chars().next() {
            Some('M') | Some('m') => Sex::Male,
            Some('F') | Some('f') => Sex::Female,
            _ => Sex::Unknown,
        }
    }

    /// Given name and surname, preferring the `GIVN`/`SURN` parts and
    /// falling back to splitting a `Given /Surname/` style `NAME`.
    pub fn name_parts(&self) -> NameParts {
        let nickname = self.nickname.clone();
        if !self.given_name.is_empty() || !self.surname.is_empty() {
            return NameParts {
                given: self.given_name.clone(),
                surname: self.surname.clone(),
                nickname,
            };
        }

        match self.name.split_once('/') {
            Some((given, rest)) => {
                let surname = rest.split('/').next().unwrap_or_default();
                NameParts {
                    given: given.trim().to_string(),
                    surname: surname.trim().to_string(),
                    nickname,
                }
            }
            None => NameParts {
                given: self.name.trim().to_string(),
                surname: String::new(),
                nickname,
            },
        }
    }

    /// Given name and surname for listings, or the xref when unnamed.
    pub fn display_name(&self) -> String {
        let parts = self.name_parts();
        let full = [parts.given.as_str(), parts.surname.as_str()]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ");
        if full.is_empty() {
            format!("@{}@", self.xref)
        } else {
            full
        }
    }
}

#[derive(Debug, Clone)]
pub struct Family {
    pub id: FamilyId,
    pub xref: String,
    pub declared: bool,
    pub husband: Option<IndividualId>,
    pub wife: Option<IndividualId>,
    pub marriage: Event,
    pub divorce: Event,
    /// In declaration order.
    pub children: Vec<IndividualId>,
}

impl Family {
    pub fn new(id: FamilyId, xref: &str) -> Self {
        Self {
            id,
            xref: xref.to_string(),
            declared: false,
            husband: None,
            wife: None,
            marriage: Event::default(),
            divorce: Event::default(),
            children: Vec::new(),
        }
    }
}

/// Arena of all records of one conversion run, together with the interning
/// tables that hand out their ids.
#[derive(Debug, Clone)]
pub struct Graph {
    individuals: Vec<Individual>,
    families: Vec<Family>,
    individual_xrefs: XrefTable<IndividualId>,
    family_xrefs: XrefTable<FamilyId>,
    /// Base file name from the `HEAD` record's `FILE` attribute.
    pub file: String,
}

impl Graph {
    pub fn new(individual_capacity: usize, family_capacity: usize) -> Self {
        Self {
            individuals: Vec::new(),
            families: Vec::new(),
            individual_xrefs: XrefTable::new(individual_capacity),
            family_xrefs: XrefTable::new(family_capacity),
            file: String::new(),
        }
    }

    /// Resolve an individual xref, creating an empty record on first mention.
    pub fn intern_individual(&mut self, xref: &str) -> Option<IndividualId> {
        let interned = self.individual_xrefs.resolve(xref)?;
        if interned.fresh {
            self.individuals.push(Individual::new(interned.id, xref));
        }
        Some(interned.id)
    }

    /// Resolve a family xref, creating an empty record on first mention.
    pub fn intern_family(&mut self, xref: &str) -> Option<FamilyId> {
        let interned = self.family_xrefs.resolve(xref)?;
        if interned.fresh {
            self.families.push(Family::new(interned.id, xref));
        }
        Some(interned.id)
    }

    pub fn individual(&self, id: IndividualId) -> &Individual {
        &self.individuals[id.index()]
    }

    pub fn individual_mut(&mut self, id: IndividualId) -> &mut Individual {
        &mut self.individuals[id.index()]
    }

    pub fn family(&self, id: FamilyId) -> &Family {
        &self.families[id.index()]
    }

    pub fn family_mut(&mut self, id: FamilyId) -> &mut Family {
        &mut self.families[id.index()]
    }

    /// Look up an individual by xref (without the `@` delimiters).
    pub fn find_individual(&self, xref: &str) -> Option<&Individual> {
        self.individual_xrefs
            .get(xref)
            .map(|id| self.individual(id))
    }

    pub fn find_family(&self, xref: &str) -> Option<&Family> {
        self.family_xrefs.get(xref).map(|id| self.family(id))
    }

    /// Individuals in id order.
    pub fn individuals(&self) -> impl Iterator<Item = &Individual> {
        self.individuals.iter()
    }

    pub fn individuals_mut(&mut self) -> impl Iterator<Item = &mut Individual> {
        self.individuals.iter_mut()
    }

    /// Families in id order.
    pub fn families(&self) -> impl Iterator<Item = &Family> {
        self.families.iter()
    }

    /// Families in which `id` is a spouse: its own `FAMS` links followed by
    /// any family naming it as `HUSB` or `WIFE` without a matching `FAMS`.
    pub fn spouse_families_of(&self, id: IndividualId) -> Vec<FamilyId> {
        let mut found = self.individual(id).spouse_families.clone();
        for family in &self.families {
            let named = family.husband == Some(id) || family.wife == Some(id);
            if named && !found.contains(&family.id) {
                found.push(family.id);
            }
        }
        found
    }

    /// The other spouse of `id` in `family_id`.
    ///
    /// The family's own `HUSB`/`WIFE` lines decide. When the family does not
    /// name `id` at all, a recorded male takes the wife and anyone else the
    /// husband.
    pub fn partner_in(&self, id: IndividualId, family_id: FamilyId) -> Option<IndividualId> {
        let family = self.family(family_id);
        if family.husband == Some(id) {
            family.wife
        } else if family.wife == Some(id) {
            family.husband
        } else {
            match self.individual(id).sex() {
                Sex::Male => family.wife,
                Sex::Female | Sex::Unknown => family.husband,
            }
        }
    }

    /// Ids of all individuals, in id order.
    pub fn individual_ids(&self) -> Vec<IndividualId> {
        self.individuals.iter().map(|i| i.id).collect()
    }

    pub fn individual_count(&self) -> usize {
        self.individuals.len()
    }

    pub fn family_count(&self) -> usize {
        self.families.len()
    }

    /// Look up an individual by its numeric id, as written in override files.
    pub fn individual_by_number(&self, number: u32) -> Option<&Individual> {
        let index = (number as usize).checked_sub(1)?;
        self.individuals.get(index)
    }

    pub fn individual_by_number_mut(&mut self, number: u32) -> Option<&mut Individual> {
        let index = (number as usize).checked_sub(1)?;
        self.individuals.get_mut(index)
    }

    pub fn set_file(&mut self, value: &str) {
        self.file = bounded(value, limits::FILE);
    }
}
