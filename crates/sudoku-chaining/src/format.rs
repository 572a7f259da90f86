//! Text rendering of nodes and chains.

use crate::candidate::{cell_pos, mask_digits, CandidateMap, Cell, CellMap, House};
use crate::link::Inference;
use crate::node::Node;

pub const STRONG_LINK_CONNECTOR: &str = " == ";
pub const WEAK_LINK_CONNECTOR: &str = " -- ";

/// Turns board coordinates into text.
pub trait CoordinateConverter {
    fn cell(&self, cell: Cell) -> String;

    fn cells(&self, cells: &CellMap) -> String;

    fn house(&self, house: House) -> String;

    /// Candidates grouped by digit, e.g. `r1c12(5)`.
    fn candidates(&self, map: &CandidateMap) -> String {
        mask_digits(map.digits())
            .map(|digit| format!("{}({})", self.cells(&map.cells_of_digit(digit)), digit + 1))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn node(&self, node: &Node) -> String {
        self.candidates(&node.map)
    }
}

/// `r1c1` notation. Cells on one row or one column are compressed
/// (`r1c123`, `r123c1`).
#[derive(Debug, Clone, Copy, Default)]
pub struct RxCyConverter;

impl CoordinateConverter for RxCyConverter {
    fn cell(&self, cell: Cell) -> String {
        let (row, col) = cell_pos(cell);
        format!("r{}c{}", row + 1, col + 1)
    }

    fn cells(&self, cells: &CellMap) -> String {
        let positions: Vec<(usize, usize)> = cells.iter().map(cell_pos).collect();
        let Some(&(row0, col0)) = positions.first() else {
            return String::new();
        };
        let digits = |values: &mut dyn Iterator<Item = usize>| -> String {
            values.map(|v| char::from(b'1' + v as u8)).collect()
        };
        if positions.iter().all(|&(row, _)| row == row0) {
            format!("r{}c{}", row0 + 1, digits(&mut positions.iter().map(|p| p.1)))
        } else if positions.iter().all(|&(_, col)| col == col0) {
            format!("r{}c{}", digits(&mut positions.iter().map(|p| p.0)), col0 + 1)
        } else {
            cells.iter().map(|cell| self.cell(cell)).collect::<Vec<_>>().join("|")
        }
    }

    fn house(&self, house: House) -> String {
        match house {
            0..=8 => format!("r{}", house + 1),
            9..=17 => format!("c{}", house - 8),
            _ => format!("b{}", house - 17),
        }
    }
}

/// Render `nodes` joined by the connector of each inference. A closed
/// sequence repeats the first node after the wrap link.
pub fn format_sequence(
    nodes: &[Node],
    inferences: &[Inference],
    closes: bool,
    converter: &dyn CoordinateConverter,
) -> String {
    let mut out = String::new();
    for (i, node) in nodes.iter().enumerate() {
        if i > 0 {
            out.push_str(connector(inferences.get(i - 1)));
        }
        out.push_str(&converter.node(node));
    }
    if closes {
        if let Some(first) = nodes.first() {
            out.push_str(connector(inferences.get(nodes.len() - 1)));
            out.push_str(&converter.node(first));
        }
    }
    out
}

fn connector(inference: Option<&Inference>) -> &'static str {
    match inference {
        Some(Inference::Strong) => STRONG_LINK_CONNECTOR,
        _ => WEAK_LINK_CONNECTOR,
    }
}
