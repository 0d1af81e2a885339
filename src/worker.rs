use std::panic::{self, AssertUnwindSafe};
use std::sync::Mutex;

use rayon::ThreadPoolBuilder;
use tracing::{debug, warn};

use crate::comm::{ChannelCommunicator, Communicator};
use crate::error::{BoundaryError, Result};
use crate::fragment::PartitionedGraph;
use crate::types::graph_query::FragmentQuery;

/// A graph application in the two-phase model: one partial evaluation on every
/// fragment, followed by incremental evaluation rounds.
///
/// One-shot applications do all of their work in `peval` and keep the default `inc_eval`.
pub trait ParallelApp: Sync {
    type Output: Send;

    fn peval<F, C>(&self, frag: &F, comm: &mut C) -> Result<Self::Output>
    where
        F: FragmentQuery,
        C: Communicator;

    fn inc_eval<F, C>(&self, _frag: &F, _comm: &mut C, _output: &mut Self::Output) -> Result<()>
    where
        F: FragmentQuery,
        C: Communicator,
    {
        Ok(())
    }
}

/// Runs an application on one fragment.
pub struct Worker<'a, F, C> {
    fragment: &'a F,
    comm: C,
}

impl<'a, F, C> Worker<'a, F, C>
where
    F: FragmentQuery,
    C: Communicator,
{
    pub fn new(fragment: &'a F, comm: C) -> Self {
        Self { fragment, comm }
    }

    pub fn run<A: ParallelApp>(&mut self, app: &A) -> Result<A::Output> {
        let fid = self.fragment.fid();
        debug!(fid, "peval");
        let mut output = app.peval(self.fragment, &mut self.comm)?;
        debug!(fid, "inc_eval");
        app.inc_eval(self.fragment, &mut self.comm, &mut output)?;
        Ok(output)
    }
}

/// Runs `app` on every fragment of `graph`, one worker thread per fragment.
///
/// Workers run on a dedicated pool with exactly one thread per fragment, so a worker
/// blocked in a collective never keeps a peer from being scheduled.
///
/// # Returns
///
/// The per-fragment outputs in fid order, or the error that caused the failure. When
/// one worker fails, its peers usually fail too with a communication error; the
/// original failure is reported in preference to those.
pub fn run_workers<A: ParallelApp>(graph: &PartitionedGraph, app: &A) -> Result<Vec<A::Output>> {
    let fnum = graph.fnum();
    let communicators = ChannelCommunicator::group(fnum)
        .into_iter()
        .map(|comm| Mutex::new(Some(comm)))
        .collect::<Vec<_>>();
    let pool = ThreadPoolBuilder::new()
        .num_threads(fnum)
        .thread_name(|idx| format!("worker-{}", idx))
        .build()?;

    let results = pool.broadcast(|ctx| {
        let fid = ctx.index();
        let comm = communicators[fid]
            .lock()
            .ok()
            .and_then(|mut slot| slot.take());
        let (Some(fragment), Some(comm)) = (graph.fragment(fid), comm) else {
            return Err(BoundaryError::Communication {
                worker: fid,
                reason: "no fragment or communicator for this worker".to_string(),
            });
        };
        let fragment = fragment.as_ref();
        panic::catch_unwind(AssertUnwindSafe(|| Worker::new(fragment, comm).run(app)))
            .unwrap_or(Err(BoundaryError::WorkerPanicked(fid)))
    });

    let mut outputs = Vec::with_capacity(fnum);
    let mut first_error: Option<BoundaryError> = None;
    for (fid, result) in results.into_iter().enumerate() {
        match result {
            Ok(output) => outputs.push(output),
            Err(err) => {
                warn!(fid, error = %err, "worker failed");
                let replace = match &first_error {
                    None => true,
                    Some(BoundaryError::Communication { .. }) => {
                        !matches!(err, BoundaryError::Communication { .. })
                    }
                    Some(_) => false,
                };
                if replace {
                    first_error = Some(err);
                }
            }
        }
    }
    match first_error {
        Some(err) => Err(err),
        None => Ok(outputs),
    }
}

#[cfg(test)]
mod test_worker {
    use crate::comm::Communicator;
    use crate::error::{BoundaryError, Result};
    use crate::fragment::PartitionedGraph;
    use crate::types::graph_query::FragmentQuery;
    use crate::types::Oid;
    use crate::worker::{run_workers, ParallelApp};

    /// Gathers the inner vertex count of every fragment.
    struct CountVertices;

    impl ParallelApp for CountVertices {
        type Output = usize;

        fn peval<F, C>(&self, frag: &F, comm: &mut C) -> Result<usize>
        where
            F: FragmentQuery,
            C: Communicator,
        {
            let counts = comm.all_gather(&frag.inner_vertex_num())?;
            Ok(counts.iter().sum())
        }
    }

    /// Fails on fragment 1 before the collective.
    struct FailOnOne;

    impl ParallelApp for FailOnOne {
        type Output = ();

        fn peval<F, C>(&self, frag: &F, comm: &mut C) -> Result<()>
        where
            F: FragmentQuery,
            C: Communicator,
        {
            if frag.fid() == 1 {
                return Err(BoundaryError::UnknownGlobalId(7));
            }
            comm.barrier()
        }
    }

    /// Panics on fragment 0 before the collective.
    struct PanicOnZero;

    impl ParallelApp for PanicOnZero {
        type Output = ();

        fn peval<F, C>(&self, frag: &F, comm: &mut C) -> Result<()>
        where
            F: FragmentQuery,
            C: Communicator,
        {
            if frag.fid() == 0 {
                panic!("boom");
            }
            comm.barrier()
        }
    }

    fn small_graph(fnum: usize) -> PartitionedGraph {
        let vertices = (0..10).map(Oid::Int).collect::<Vec<_>>();
        let edges = (0..9).map(|i| (Oid::Int(i), Oid::Int(i + 1))).collect::<Vec<_>>();
        PartitionedGraph::build_hashed(&vertices, &edges, fnum).unwrap()
    }

    #[test]
    fn test_run_workers() {
        let graph = small_graph(3);
        let outputs = run_workers(&graph, &CountVertices).unwrap();
        assert_eq!(outputs, vec![10, 10, 10]);
    }

    #[test]
    fn test_run_workers_reports_root_error() {
        let graph = small_graph(3);
        let result = run_workers(&graph, &FailOnOne);
        assert!(matches!(result, Err(BoundaryError::UnknownGlobalId(7))));
    }

    #[test]
    fn test_run_workers_reports_panic() {
        let graph = small_graph(2);
        let result = run_workers(&graph, &PanicOnZero);
        assert!(matches!(result, Err(BoundaryError::WorkerPanicked(0))));
    }
}
