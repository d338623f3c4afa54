//! Client-side table sorting shared by the Services and Traces views.

use std::cmp::Ordering;

/// Value of one cell, as used for ordering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortValue<'a> {
    /// Compared case-insensitively.
    Text(&'a str),
    /// Compared numerically with a total order.
    Number(f64),
}

/// A table row that can be ordered by any of its columns `C`.
pub trait Sortable<C> {
    fn sort_value(&self, column: C) -> SortValue<'_>;

    /// Unique row identity, used to break ties.
    fn identity(&self) -> &str;
}

/// Current sort column and direction of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState<C> {
    pub column: C,
    pub ascending: bool,
}

impl<C: Copy + PartialEq> SortState<C> {
    pub fn new(column: C) -> Self {
        Self {
            column,
            ascending: true,
        }
    }

    /// Select `column`. Re-selecting the current column flips the direction,
    /// a different column starts ascending.
    pub fn select(&mut self, column: C) {
        if self.column == column {
            self.ascending = !self.ascending;
        } else {
            self.column = column;
            self.ascending = true;
        }
    }

    pub fn toggle(&mut self) {
        self.ascending = !self.ascending;
    }

    /// Arrow shown next to the sorted column header.
    pub fn arrow(&self) -> &'static str {
        if self.ascending {
            "↑"
        } else {
            "↓"
        }
    }

    /// Header label with the arrow appended when `column` is the sorted one.
    pub fn header(&self, label: &str, column: C) -> String {
        if self.column == column {
            format!("{}{}", label, self.arrow())
        } else {
            label.to_string()
        }
    }
}

/// Order two cell values. Numbers sort before text when a column mixes them.
pub fn compare_values(a: &SortValue<'_>, b: &SortValue<'_>) -> Ordering {
    match (a, b) {
        (SortValue::Text(a), SortValue::Text(b)) => a
            .chars()
            .flat_map(char::to_lowercase)
            .cmp(b.chars().flat_map(char::to_lowercase)),
        (SortValue::Number(a), SortValue::Number(b)) => a.total_cmp(b),
        (SortValue::Number(_), SortValue::Text(_)) => Ordering::Less,
        (SortValue::Text(_), SortValue::Number(_)) => Ordering::Greater,
    }
}

/// Sort `rows` in place by the state's column and direction.
///
/// Descending order is exactly the reverse of ascending order.
pub fn sort_rows<T, C>(rows: &mut [&T], state: &SortState<C>)
where
    T: Sortable<C> + ?Sized,
    C: Copy,
{
    let column = state.column;
    rows.sort_by(|a, b| {
        compare_values(&a.sort_value(column), &b.sort_value(column))
            .then_with(|| a.identity().cmp(b.identity()))
    });
    if !state.ascending {
        rows.reverse();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Col {
        Name,
        Latency,
        Count,
    }

    const COLUMNS: [Col; 3] = [Col::Name, Col::Latency, Col::Count];

    #[derive(Debug, PartialEq)]
    struct Row {
        name: &'static str,
        latency: f64,
        count: u64,
    }

    impl Sortable<Col> for Row {
        fn sort_value(&self, column: Col) -> SortValue<'_> {
            match column {
                Col::Name => SortValue::Text(self.name),
                Col::Latency => SortValue::Number(self.latency),
                Col::Count => SortValue::Number(self.count as f64),
            }
        }

        fn identity(&self) -> &str {
            self.name
        }
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { name: "payments", latency: 12.5, count: 10 },
            Row { name: "Checkout", latency: 80.0, count: 10 },
            Row { name: "auth", latency: 12.5, count: 400 },
            Row { name: "inventory", latency: f64::NAN, count: 0 },
            Row { name: "gateway", latency: 3.0, count: 10 },
        ]
    }

    fn names(rows: &[&Row]) -> Vec<&'static str> {
        rows.iter().map(|r| r.name).collect()
    }

    #[test]
    fn test_descending_is_reverse_of_ascending_for_every_column() {
        let data = rows();
        for column in COLUMNS {
            let mut state = SortState::new(column);
            let mut asc: Vec<&Row> = data.iter().collect();
            sort_rows(&mut asc, &state);

            state.select(column);
            assert!(!state.ascending);
            let mut desc: Vec<&Row> = data.iter().collect();
            sort_rows(&mut desc, &state);

            let mut reversed = names(&asc);
            reversed.reverse();
            assert_eq!(names(&desc), reversed, "column {:?}", column);
            assert_eq!(desc.len(), data.len());
        }
    }

    #[test]
    fn test_text_is_case_insensitive() {
        let data = rows();
        let mut sorted: Vec<&Row> = data.iter().collect();
        sort_rows(&mut sorted, &SortState::new(Col::Name));
        assert_eq!(
            names(&sorted),
            vec!["auth", "Checkout", "gateway", "inventory", "payments"]
        );
    }

    #[test]
    fn test_numeric_ties_break_on_identity() {
        let data = rows();
        let mut sorted: Vec<&Row> = data.iter().collect();
        sort_rows(&mut sorted, &SortState::new(Col::Count));
        assert_eq!(
            names(&sorted),
            vec!["inventory", "Checkout", "gateway", "payments", "auth"]
        );
    }

    #[test]
    fn test_selecting_new_column_resets_to_ascending() {
        let mut state = SortState::new(Col::Name);
        state.toggle();
        assert!(!state.ascending);

        state.select(Col::Latency);
        assert_eq!(state.column, Col::Latency);
        assert!(state.ascending);

        state.select(Col::Latency);
        assert!(!state.ascending);
        assert_eq!(state.header("P95", Col::Latency), "P95↓");
        assert_eq!(state.header("Name", Col::Name), "Name");
    }

    #[test]
    fn test_nan_sorts_consistently() {
        let a = SortValue::Number(f64::NAN);
        let b = SortValue::Number(1.0);
        assert_eq!(compare_values(&a, &b), compare_values(&b, &a).reverse());
    }
}
