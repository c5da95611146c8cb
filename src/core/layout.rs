// src/core/layout.rs
use serde::Serialize;

use crate::config::LayoutConfig;
use super::diagram::{Columns, Element};

const MARGIN: usize = 1;
const GUTTER: usize = 1;
const NAME: usize = 1;

/// Which palette entry a cell is painted with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CellRole {
    Blank,
    Name,
    Method,
    Attribute,
    Member,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cell {
    pub text: String,
    pub color: String,
    pub role: CellRole,
    pub row_span: usize,
    pub col_span: usize,
    /// Node id edges can attach to
    pub port: Option<String>,
}

impl Cell {
    pub fn is_blank(&self) -> bool {
        self.role == CellRole::Blank
    }
}

pub type Row = Vec<Cell>;

/// A laid-out grid for one sub-diagram
#[derive(Debug, Clone, Serialize)]
pub struct TableLayout {
    pub width: usize,
    pub max_left: usize,
    pub max_right: usize,
    pub rows: Vec<Row>,
}

/// Turns element summaries into padded rows of cells
pub struct LayoutEngine<'a> {
    config: &'a LayoutConfig,
}

impl<'a> LayoutEngine<'a> {
    pub fn new(config: &'a LayoutConfig) -> Self {
        Self { config }
    }

    pub fn layout(&self, elements: &[Element]) -> TableLayout {
        let (max_left, max_right) = self.column_counts(elements);
        let width = MARGIN + max_left + GUTTER + NAME + max_right + MARGIN;

        let mut table = TableLayout {
            width,
            max_left,
            max_right,
            rows: Vec::new(),
        };
        for element in elements {
            match &element.columns {
                Columns::Double { left, right } => {
                    self.double_rows(&mut table, element, left, right);
                }
                Columns::Single(items) => self.single_rows(&mut table, element, items),
                Columns::Empty => self.single_rows(&mut table, element, &[]),
            }
            table.rows.push(vec![self.blank_span(width)]);
        }
        table
    }

    /// Widest left/right lists of the two-column elements, clamped to the configured range
    fn column_counts(&self, elements: &[Element]) -> (usize, usize) {
        let (left, right) = elements
            .iter()
            .filter(|e| e.is_double())
            .fold((0, 0), |(l, r), e| (l.max(e.left().len()), r.max(e.right().len())));
        (self.clamp(left), self.clamp(right))
    }

    fn clamp(&self, n: usize) -> usize {
        n.clamp(self.config.min_columns, self.config.max_columns)
    }

    fn double_rows(&self, table: &mut TableLayout, element: &Element, left: &[Element], right: &[Element]) {
        let left_rows = rows_needed(left.len(), table.max_left);
        let right_rows = rows_needed(right.len(), table.max_right);
        let rows = left_rows.max(right_rows).max(1);

        let (left_grid, right_grid) = if left_rows >= right_rows {
            (
                pad_row_major(left, table.max_left, rows),
                pad_column_major(right, table.max_right, rows),
            )
        } else {
            (
                pad_column_major(left, table.max_left, rows),
                pad_row_major(right, table.max_right, rows),
            )
        };

        for (i, (left_row, right_row)) in left_grid.into_iter().zip(right_grid).enumerate() {
            let mut row = vec![self.blank()];
            row.extend(
                left_row
                    .into_iter()
                    .rev()
                    .map(|item| self.member_cell(item, CellRole::Method)),
            );
            row.push(self.blank());
            if i == 0 {
                row.push(Cell {
                    text: element.name.clone(),
                    color: self.config.palette.name.clone(),
                    role: CellRole::Name,
                    row_span: rows,
                    col_span: 1,
                    port: Some(element.id.clone()),
                });
            }
            row.extend(
                right_row
                    .into_iter()
                    .map(|item| self.member_cell(item, CellRole::Attribute)),
            );
            row.push(self.blank());
            table.rows.push(row);
        }
    }

    fn single_rows(&self, table: &mut TableLayout, element: &Element, items: &[Element]) {
        let width = table.width;
        for chunk in items.chunks(width) {
            let mut row: Row = chunk
                .iter()
                .map(|item| self.member_cell(Some(item), CellRole::Member))
                .collect();
            row.resize_with(width, || self.blank());
            table.rows.push(row);
        }
        table.rows.push(vec![Cell {
            text: element.name.clone(),
            color: self.config.palette.name.clone(),
            role: CellRole::Name,
            row_span: 1,
            col_span: width,
            port: Some(element.id.clone()),
        }]);
    }

    fn member_cell(&self, item: Option<&Element>, role: CellRole) -> Cell {
        let Some(item) = item else {
            return self.blank();
        };
        let palette = &self.config.palette;
        let color = match role {
            CellRole::Method => &palette.method,
            CellRole::Attribute => &palette.attribute,
            CellRole::Member => &palette.function,
            CellRole::Name => &palette.name,
            CellRole::Blank => &palette.blank,
        };
        Cell {
            text: item.name.clone(),
            color: color.clone(),
            role,
            row_span: 1,
            col_span: 1,
            port: Some(item.id.clone()),
        }
    }

    fn blank(&self) -> Cell {
        self.blank_span(1)
    }

    fn blank_span(&self, col_span: usize) -> Cell {
        Cell {
            text: String::new(),
            color: self.config.palette.blank.clone(),
            role: CellRole::Blank,
            row_span: 1,
            col_span,
            port: None,
        }
    }
}

fn rows_needed(items: usize, capacity: usize) -> usize {
    if capacity == 0 {
        return 0;
    }
    items.div_ceil(capacity)
}

/// Fill rows one after another, blanks trail in the last row
fn pad_row_major(items: &[Element], capacity: usize, rows: usize) -> Vec<Vec<Option<&Element>>> {
    (0..rows)
        .map(|r| {
            (0..capacity)
                .map(|c| items.get(r * capacity + c))
                .collect()
        })
        .collect()
}

/// Deal items across rows so each row gets its share, blanks trail within each row
fn pad_column_major(items: &[Element], capacity: usize, rows: usize) -> Vec<Vec<Option<&Element>>> {
    let mut grid: Vec<Vec<Option<&Element>>> = vec![Vec::with_capacity(capacity); rows];
    for (k, item) in items.iter().enumerate() {
        grid[k % rows].push(Some(item));
    }
    for row in &mut grid {
        row.resize(capacity, None);
    }
    grid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::core::diagram::NodeKind;

    fn leaf(name: &str, kind: NodeKind) -> Element {
        Element {
            id: format!("pkg/{}", name),
            name: name.to_string(),
            kind,
            columns: Columns::Empty,
        }
    }

    fn class(name: &str, methods: usize, attributes: usize) -> Element {
        Element {
            id: format!("pkg/{}", name),
            name: name.to_string(),
            kind: NodeKind::Class,
            columns: Columns::Double {
                left: (0..methods).map(|i| leaf(&format!("m{}", i), NodeKind::Method)).collect(),
                right: (0..attributes).map(|i| leaf(&format!("a{}", i), NodeKind::Attribute)).collect(),
            },
        }
    }

    fn fixed(columns: usize) -> LayoutConfig {
        LayoutConfig {
            min_columns: columns,
            max_columns: columns,
            ..LayoutConfig::default()
        }
    }

    fn texts(cells: &[Cell]) -> Vec<&str> {
        cells.iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn test_one_left_five_right_balances_rows() {
        let config = fixed(3);
        let table = LayoutEngine::new(&config).layout(&[class("User", 1, 5)]);

        assert_eq!(table.width, 1 + 3 + 1 + 1 + 3 + 1);
        // two element rows plus the spacer
        assert_eq!(table.rows.len(), 3);

        let first = &table.rows[0];
        let second = &table.rows[1];
        // margin, 3 left, gutter, name, 3 right, margin
        assert_eq!(first.len(), 10);
        assert_eq!(second.len(), 9);

        // left side is reversed: the single method sits next to the name cell
        assert_eq!(texts(&first[1..4]), vec!["", "", "m0"]);
        assert!(second[1..4].iter().all(Cell::is_blank));

        assert_eq!(first[5].role, CellRole::Name);
        assert_eq!(first[5].row_span, 2);

        let right_first: Vec<_> = first[6..9].iter().filter(|c| !c.is_blank()).collect();
        let right_second: Vec<_> = second[5..8].iter().filter(|c| !c.is_blank()).collect();
        assert_eq!(right_first.len(), 3);
        assert_eq!(right_second.len(), 2);
    }

    #[test]
    fn test_column_major_spreads_the_shorter_side() {
        let config = fixed(2);
        let table = LayoutEngine::new(&config).layout(&[class("Order", 6, 3)]);

        // methods need 3 rows; the 3 attributes are dealt one per row
        let element_rows = &table.rows[..3];
        for (i, row) in element_rows.iter().enumerate() {
            let offset = if i == 0 { 5 } else { 4 };
            let attributes = row[offset..offset + 2].iter().filter(|c| !c.is_blank()).count();
            assert_eq!(attributes, 1, "row {}", i);
        }
    }

    #[test]
    fn test_column_counts_are_clamped() {
        let config = LayoutConfig::default();
        let engine = LayoutEngine::new(&config);

        let small = engine.layout(&[class("A", 0, 0)]);
        assert_eq!((small.max_left, small.max_right), (2, 2));
        // an empty class still gets a row with its name
        assert_eq!(small.rows.len(), 2);

        let large = engine.layout(&[class("B", 9, 1)]);
        assert_eq!((large.max_left, large.max_right), (5, 2));
    }

    #[test]
    fn test_single_column_chunks_and_footer() {
        let config = fixed(2);
        let functions = Element {
            id: "#pkg#abstraction".to_string(),
            name: "abstraction".to_string(),
            kind: NodeKind::Bucket,
            columns: Columns::Single((0..9).map(|i| leaf(&format!("f{}", i), NodeKind::Function)).collect()),
        };
        let table = LayoutEngine::new(&config).layout(&[functions]);

        // width 8: one full row, one row with a single item, footer, spacer
        assert_eq!(table.width, 8);
        assert_eq!(table.rows.len(), 4);
        assert_eq!(table.rows[1].len(), 8);
        assert_eq!(table.rows[1].iter().filter(|c| !c.is_blank()).count(), 1);

        let footer = &table.rows[2][0];
        assert_eq!(footer.text, "abstraction");
        assert_eq!(footer.col_span, 8);
        assert_eq!(table.rows[3][0].col_span, 8);
    }

    #[test]
    fn test_cells_carry_ports_and_colours() {
        let config = fixed(2);
        let table = LayoutEngine::new(&config).layout(&[class("User", 1, 1)]);
        let row = &table.rows[0];

        let method = row.iter().find(|c| c.role == CellRole::Method).unwrap();
        assert_eq!(method.port.as_deref(), Some("pkg/m0"));
        assert_eq!(method.color, config.palette.method);
        assert!(row.iter().filter(|c| c.is_blank()).all(|c| c.port.is_none()));
    }
}
