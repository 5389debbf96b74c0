use crossbeam_utils::atomic::AtomicCell;
use log::debug;

pub fn default_workers() -> usize {
  std::cmp::max(num_cpus::get().saturating_sub(2), 2)
}

/// Applies `f` to contiguous chunks of `items` on a pool of scoped worker
/// threads. Results come back in chunk order regardless of which worker
/// finished first.
pub fn map_chunks<T, R, F>(items: &[T], chunk_size: usize, workers: usize, f: F) -> Vec<R>
where
  T: Sync,
  R: Send,
  F: Fn(&[T]) -> R + Sync,
{
  let chunk_size = chunk_size.max(1);
  let chunk_count = (items.len() + chunk_size - 1) / chunk_size;
  if chunk_count == 0 {
    return Vec::new();
  }
  let workers = workers.clamp(1, chunk_count);
  debug!(
    "Splitting {} items into {} chunks over {} workers",
    items.len(),
    chunk_count,
    workers
  );

  // workers pull the next chunk index from a shared counter
  let next_chunk = AtomicCell::new(0usize);
  let (result_tx, result_rx) = crossbeam_channel::unbounded::<(usize, R)>();

  let scoped = crossbeam_utils::thread::scope(|scope| {
    for worker_id in 0..workers {
      let result_tx = result_tx.clone();
      let next_chunk = &next_chunk;
      let f = &f;
      scope.spawn(move |_| {
        let mut processed = 0;
        loop {
          let i = next_chunk.fetch_add(1);
          if i >= chunk_count {
            break;
          }
          let start = i * chunk_size;
          let end = std::cmp::min(start + chunk_size, items.len());
          if result_tx.send((i, f(&items[start..end]))).is_err() {
            break;
          }
          processed += 1;
        }
        debug!("Worker {} finished, {} chunks", worker_id, processed);
      });
    }
  });
  if let Err(panic) = scoped {
    std::panic::resume_unwind(panic);
  }
  drop(result_tx);

  let mut results: Vec<(usize, R)> = result_rx.iter().collect();
  results.sort_by_key(|(i, _)| *i);
  results.into_iter().map(|(_, r)| r).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_map_chunks_keeps_order() {
    let items: Vec<u32> = (0..1000).collect();
    let sums = map_chunks(&items, 7, 4, |chunk| chunk.iter().sum::<u32>());
    let expected: Vec<u32> = items.chunks(7).map(|c| c.iter().sum()).collect();
    assert_eq!(sums, expected);
  }

  #[test]
  fn test_map_chunks_more_workers_than_chunks() {
    let items = vec![1, 2, 3];
    let out = map_chunks(&items, 2, 16, |chunk| chunk.to_vec());
    assert_eq!(out, vec![vec![1, 2], vec![3]]);
  }

  #[test]
  fn test_map_chunks_empty() {
    let items: Vec<u8> = vec![];
    let out = map_chunks(&items, 10, 4, |chunk| chunk.len());
    assert!(out.is_empty());
  }

  #[test]
  fn test_default_workers() {
    assert!(default_workers() >= 2);
  }
}
