//! Prospect model and the tabular-row adapter.
//!
//! The core never reads CSV itself; callers resolve their header row against
//! the recognized column aliases and feed plain [`ProspectRow`] values in.
//! Rows missing an id or a name are skipped silently, per the input
//! contract.

use thiserror::Error;

/// Recognized header aliases for the prospect id column.
pub const ID_ALIASES: &[&str] = &["prospect_id", "Prospect ID", "prospectId", "id", "ID"];

/// Recognized header aliases for the prospect name column.
pub const NAME_ALIASES: &[&str] = &["prospect_name", "Prospect Name", "Name", "name"];

/// Recognized header aliases for the (optional) employer column.
pub const COMPANY_ALIASES: &[&str] = &["company_name", "Company Name", "Company", "company"];

/// Recognized header aliases for the (optional) team column.
pub const TEAM_ALIASES: &[&str] = &["team_name", "Team Name", "Team", "team"];

#[derive(Error, Debug)]
pub enum ProspectError {
    #[error("no prospect id column found (recognized: {0})")]
    MissingIdColumn(String),
    #[error("no prospect name column found (recognized: {0})")]
    MissingNameColumn(String),
}

/// One raw input row, already mapped out of whatever tabular source.
#[derive(Debug, Clone, Default)]
pub struct ProspectRow {
    pub id: String,
    pub name: String,
    pub company: Option<String>,
    pub team: Option<String>,
}

/// A loaded prospect. Immutable after load.
#[derive(Debug, Clone)]
pub struct Prospect {
    pub id: String,
    pub name: String,
    pub company: Option<String>,
    pub team: Option<String>,
}

/// Column positions resolved from a header row.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    pub id: usize,
    pub name: usize,
    pub company: Option<usize>,
    pub team: Option<usize>,
}

impl ColumnMap {
    /// Resolve a header row against the alias tables. The id and name
    /// columns are required; company and team are optional. First matching
    /// alias wins.
    pub fn resolve(headers: &[String]) -> Result<ColumnMap, ProspectError> {
        let find = |aliases: &[&str]| {
            headers
                .iter()
                .position(|h| aliases.iter().any(|a| h.trim() == *a))
        };
        let id = find(ID_ALIASES)
            .ok_or_else(|| ProspectError::MissingIdColumn(ID_ALIASES.join(", ")))?;
        let name = find(NAME_ALIASES)
            .ok_or_else(|| ProspectError::MissingNameColumn(NAME_ALIASES.join(", ")))?;
        Ok(ColumnMap {
            id,
            name,
            company: find(COMPANY_ALIASES),
            team: find(TEAM_ALIASES),
        })
    }

    /// Map one data row to a [`ProspectRow`]. Missing cells become empty.
    pub fn row(&self, cells: &[String]) -> ProspectRow {
        let cell = |i: usize| cells.get(i).map(|c| c.trim().to_string()).unwrap_or_default();
        let optional = |i: Option<usize>| {
            i.and_then(|i| cells.get(i))
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
        };
        ProspectRow {
            id: cell(self.id),
            name: cell(self.name),
            company: optional(self.company),
            team: optional(self.team),
        }
    }
}

/// Materialize prospects from adapter rows.
///
/// Rows without an id or a name are dropped without comment; duplicate ids
/// keep the first occurrence and log the rest.
pub fn load_prospects(rows: impl IntoIterator<Item = ProspectRow>) -> Vec<Prospect> {
    let mut prospects: Vec<Prospect> = Vec::new();
    let mut seen_ids: Vec<String> = Vec::new();
    for row in rows {
        if row.id.is_empty() || row.name.is_empty() {
            continue;
        }
        if seen_ids.contains(&row.id) {
            tracing::warn!(id = %row.id, "duplicate prospect id, keeping first occurrence");
            continue;
        }
        seen_ids.push(row.id.clone());
        prospects.push(Prospect {
            id: row.id,
            name: row.name,
            company: row.company,
            team: row.team,
        });
    }
    prospects
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_resolve_canonical_headers() {
        let map =
            ColumnMap::resolve(&strings(&["prospect_id", "prospect_name", "company_name"])).unwrap();
        assert_eq!(map.id, 0);
        assert_eq!(map.name, 1);
        assert_eq!(map.company, Some(2));
        assert_eq!(map.team, None);
    }

    #[test]
    fn test_resolve_alias_headers() {
        let map = ColumnMap::resolve(&strings(&["Team", "ID", "Name", "Company"])).unwrap();
        assert_eq!(map.id, 1);
        assert_eq!(map.name, 2);
        assert_eq!(map.company, Some(3));
        assert_eq!(map.team, Some(0));
    }

    #[test]
    fn test_resolve_missing_name_column() {
        let err = ColumnMap::resolve(&strings(&["prospect_id", "employer"])).unwrap_err();
        assert!(matches!(err, ProspectError::MissingNameColumn(_)));
    }

    #[test]
    fn test_rows_missing_id_or_name_skipped() {
        let rows = vec![
            ProspectRow {
                id: "P1".into(),
                name: "Jane Doe".into(),
                ..Default::default()
            },
            ProspectRow {
                id: String::new(),
                name: "No Id".into(),
                ..Default::default()
            },
            ProspectRow {
                id: "P3".into(),
                name: String::new(),
                ..Default::default()
            },
        ];
        let prospects = load_prospects(rows);
        assert_eq!(prospects.len(), 1);
        assert_eq!(prospects[0].id, "P1");
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let rows = vec![
            ProspectRow {
                id: "P1".into(),
                name: "Jane Doe".into(),
                company: Some("Acme Corp".into()),
                ..Default::default()
            },
            ProspectRow {
                id: "P1".into(),
                name: "Janet Doe".into(),
                ..Default::default()
            },
        ];
        let prospects = load_prospects(rows);
        assert_eq!(prospects.len(), 1);
        assert_eq!(prospects[0].name, "Jane Doe");
    }
}
