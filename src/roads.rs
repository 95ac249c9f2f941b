// src/roads.rs
//! Дорожная сеть: минимальное остовное дерево над городами
//!
//! Рёбра полного графа сортируются по евклидовой длине (стабильно, так что
//! равные рёбра сохраняют порядок перечисления `(i, j)`, `i < j`), после чего
//! алгоритм Крускала с системой непересекающихся множеств отбирает `n − 1` ребро.
//! Каждой дороге для отрисовки назначается квадратичная кривая с небольшим
//! изгибом; изгиб не влияет на связность.

use crate::settlements::Settlement;
use petgraph::graph::UnGraph;
use petgraph::unionfind::UnionFind;
use rand::Rng;
use serde::Serialize;

/// Максимальный поперечный изгиб дороги как доля её длины
const ROAD_BEND: f64 = 0.15;

/// Ребро остовного дерева между городами `a` и `b`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoadEdge {
    pub a: usize,
    pub b: usize,
    pub length: f64,
}

/// Квадратичная кривая Безье для отрисовки дороги
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoadCurve {
    pub from: (f64, f64),
    pub control: (f64, f64),
    pub to: (f64, f64),
}

impl RoadCurve {
    /// Точка кривой при `t ∈ [0, 1]`
    #[must_use]
    pub fn sample(&self, t: f64) -> (f64, f64) {
        let u = 1.0 - t;
        let x = u * u * self.from.0 + 2.0 * u * t * self.control.0 + t * t * self.to.0;
        let y = u * u * self.from.1 + 2.0 * u * t * self.control.1 + t * t * self.to.1;
        (x, y)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RoadNetwork {
    pub edges: Vec<RoadEdge>,
    /// Кривые в том же порядке, что и `edges`
    pub curves: Vec<RoadCurve>,
}

impl RoadNetwork {
    #[must_use]
    pub fn total_length(&self) -> f64 {
        self.edges.iter().map(|e| e.length).sum()
    }

    /// Граф сети, узлы которого являются индексами городов
    #[must_use]
    pub fn graph(&self, settlement_count: usize) -> UnGraph<usize, f64> {
        let mut graph = UnGraph::with_capacity(settlement_count, self.edges.len());
        let nodes: Vec<_> = (0..settlement_count).map(|i| graph.add_node(i)).collect();
        for edge in &self.edges {
            graph.add_edge(nodes[edge.a], nodes[edge.b], edge.length);
        }
        graph
    }
}

/// Все пары городов, отсортированные по длине
fn sorted_candidate_edges(settlements: &[Settlement]) -> Vec<RoadEdge> {
    let n = settlements.len();
    let mut edges = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for a in 0..n {
        for b in a + 1..n {
            edges.push(RoadEdge {
                a,
                b,
                length: settlements[a].distance_to(&settlements[b]),
            });
        }
    }
    edges.sort_by(|x, y| x.length.total_cmp(&y.length));
    edges
}

fn bend_curve<R: Rng>(from: &Settlement, to: &Settlement, jitter: &mut R) -> RoadCurve {
    let from = (f64::from(from.x), f64::from(from.y));
    let to = (f64::from(to.x), f64::from(to.y));
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let mid = ((from.0 + to.0) / 2.0, (from.1 + to.1) / 2.0);
    let offset = (jitter.gen_range(0.0..1.0) - 0.5) * 2.0;
    RoadCurve {
        from,
        control: (
            mid.0 - dy * ROAD_BEND * offset,
            mid.1 + dx * ROAD_BEND * offset,
        ),
        to,
    }
}

/// Строит дороги между городами.
///
/// Для менее чем двух городов сеть пуста.
pub fn build_road_network<R: Rng>(settlements: &[Settlement], jitter: &mut R) -> RoadNetwork {
    let n = settlements.len();
    if n < 2 {
        return RoadNetwork::default();
    }

    let mut components = UnionFind::<usize>::new(n);
    let mut network = RoadNetwork::default();

    for edge in sorted_candidate_edges(settlements) {
        if !components.union(edge.a, edge.b) {
            continue;
        }
        network
            .curves
            .push(bend_curve(&settlements[edge.a], &settlements[edge.b], jitter));
        network.edges.push(edge);
        if network.edges.len() == n - 1 {
            break;
        }
    }

    tracing::debug!(
        target: "fantasy_mapgen::roads",
        settlements = n,
        edges = network.edges.len(),
        total_length = network.total_length(),
        "roads.built"
    );
    network
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{StageSeeds, offsets};
    use petgraph::algo::{connected_components, is_cyclic_undirected};

    fn town(x: u32, y: u32) -> Settlement {
        Settlement { x, y, size: 0.8 }
    }

    fn jitter() -> rand_chacha::ChaCha8Rng {
        StageSeeds::from_master(12345).jitter_rng(offsets::ROAD_JITTER)
    }

    fn towns() -> Vec<Settlement> {
        vec![
            town(50, 50),
            town(200, 60),
            town(120, 180),
            town(300, 300),
            town(90, 320),
            town(260, 140),
        ]
    }

    #[test]
    fn spanning_tree_shape() {
        let settlements = towns();
        let network = build_road_network(&settlements, &mut jitter());
        assert_eq!(network.edges.len(), settlements.len() - 1);
        assert_eq!(network.curves.len(), network.edges.len());

        let graph = network.graph(settlements.len());
        assert_eq!(connected_components(&graph), 1);
        assert!(!is_cyclic_undirected(&graph));
    }

    #[test]
    fn fewer_than_two_settlements() {
        assert!(build_road_network(&[], &mut jitter()).edges.is_empty());
        assert!(build_road_network(&[town(10, 10)], &mut jitter()).edges.is_empty());
    }

    #[test]
    fn picks_short_edges() {
        // Три города на прямой: длинное ребро 0–2 не нужно
        let settlements = vec![town(0, 0), town(100, 0), town(200, 0)];
        let network = build_road_network(&settlements, &mut jitter());
        let pairs: Vec<_> = network.edges.iter().map(|e| (e.a, e.b)).collect();
        assert_eq!(pairs, vec![(0, 1), (1, 2)]);
        assert!((network.total_length() - 200.0).abs() < 1e-9);
    }

    #[test]
    fn total_length_is_minimal() {
        let settlements = vec![town(0, 0), town(60, 10), town(30, 90), town(100, 80)];
        let network = build_road_network(&settlements, &mut jitter());
        let candidates = sorted_candidate_edges(&settlements);

        // Перебор всех троек рёбер, образующих остовное дерево на 4 вершинах
        let mut best = f64::INFINITY;
        for i in 0..candidates.len() {
            for j in i + 1..candidates.len() {
                for k in j + 1..candidates.len() {
                    let mut uf = UnionFind::<usize>::new(4);
                    let tree = [i, j, k]
                        .iter()
                        .all(|&e| uf.union(candidates[e].a, candidates[e].b));
                    if tree {
                        let length = candidates[i].length + candidates[j].length + candidates[k].length;
                        best = best.min(length);
                    }
                }
            }
        }
        assert!((network.total_length() - best).abs() < 1e-9);
    }

    #[test]
    fn curves_connect_endpoints() {
        let settlements = towns();
        let network = build_road_network(&settlements, &mut jitter());
        for (edge, curve) in network.edges.iter().zip(&network.curves) {
            let a = &settlements[edge.a];
            let b = &settlements[edge.b];
            assert_eq!(curve.sample(0.0), (f64::from(a.x), f64::from(a.y)));
            let (ex, ey) = curve.sample(1.0);
            assert!((ex - f64::from(b.x)).abs() < 1e-9);
            assert!((ey - f64::from(b.y)).abs() < 1e-9);
            // Изгиб не дальше 15% длины от середины
            let mid = ((curve.from.0 + curve.to.0) / 2.0, (curve.from.1 + curve.to.1) / 2.0);
            let offset = (curve.control.0 - mid.0).hypot(curve.control.1 - mid.1);
            assert!(offset <= edge.length * ROAD_BEND + 1e-9);
        }
    }

    #[test]
    fn network_is_reproducible() {
        let settlements = towns();
        assert_eq!(
            build_road_network(&settlements, &mut jitter()),
            build_road_network(&settlements, &mut jitter())
        );
    }
}
