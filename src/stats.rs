/// Counters describing how much restructuring a tree has done.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebuildStats {
    /// Scapegoat subtrees rebuilt after deep insertions.
    pub scapegoat_rebuilds: u64,
    /// Total nodes relinked by scapegoat rebuilds.
    pub scapegoat_nodes: u64,
    /// Whole-tree rebuilds triggered by deletions.
    pub global_rebuilds: u64,
    /// Total nodes relinked by whole-tree rebuilds.
    pub global_nodes: u64,
}

impl RebuildStats {
    pub(crate) fn record_scapegoat(&mut self, nodes: usize) {
        self.scapegoat_rebuilds += 1;
        self.scapegoat_nodes += nodes as u64;
    }

    pub(crate) fn record_global(&mut self, nodes: usize) {
        self.global_rebuilds += 1;
        self.global_nodes += nodes as u64;
    }

    /// Emits the counters to the tracing infrastructure.
    pub fn emit_tracing(&self) {
        tracing::info!(
            target: "scapegoat_rs::stats",
            scapegoat_rebuilds = self.scapegoat_rebuilds,
            scapegoat_nodes = self.scapegoat_nodes,
            global_rebuilds = self.global_rebuilds,
            global_nodes = self.global_nodes,
            "rebuild stats snapshot"
        );
    }
}
