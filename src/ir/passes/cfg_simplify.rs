// CFG simplification: remove blocks unreachable from the entry block and merge
// a block into its predecessor when that predecessor is the only one and
// ends in an unconditional branch to it.

use std::collections::HashSet;

use super::{Pass, PassError};
use crate::ir::types::{Block, BlockId, Function, Terminator};

#[derive(Debug, Default)]
pub struct SimplifyCfg;

impl SimplifyCfg {
    pub fn new() -> Self {
        SimplifyCfg
    }
}

fn reachable_blocks(function: &Function) -> HashSet<BlockId> {
    let mut reachable = HashSet::new();
    let mut worklist = vec![BlockId(0)];
    while let Some(id) = worklist.pop() {
        if id.0 as usize >= function.blocks.len() || !reachable.insert(id) {
            continue;
        }
        if let Some(terminator) = &function.block(id).terminator {
            worklist.extend(terminator.successors());
        }
    }
    reachable
}

fn remap(terminator: &mut Terminator, old_to_new: &[Option<BlockId>]) {
    let map = |id: &mut BlockId| {
        if let Some(Some(new)) = old_to_new.get(id.0 as usize) {
            *id = *new;
        }
    };
    match terminator {
        Terminator::Br(target) => map(target),
        Terminator::CondBr { then_block, else_block, .. } => {
            map(then_block);
            map(else_block);
        }
        Terminator::Ret(_) => {}
    }
}

/// Drop unreachable blocks, keeping the entry block first.
fn remove_unreachable(function: &mut Function) -> bool {
    let reachable = reachable_blocks(function);
    if reachable.len() == function.blocks.len() {
        return false;
    }

    let mut old_to_new = vec![None; function.blocks.len()];
    let mut blocks: Vec<Block> = Vec::with_capacity(reachable.len());
    for (old, block) in std::mem::take(&mut function.blocks).into_iter().enumerate() {
        if reachable.contains(&BlockId(old as u32)) {
            old_to_new[old] = Some(BlockId(blocks.len() as u32));
            blocks.push(block);
        }
    }
    for block in &mut blocks {
        if let Some(terminator) = &mut block.terminator {
            remap(terminator, &old_to_new);
        }
    }
    function.blocks = blocks;
    true
}

fn predecessor_counts(function: &Function) -> Vec<usize> {
    let mut preds = vec![0; function.blocks.len()];
    for block in &function.blocks {
        if let Some(terminator) = &block.terminator {
            for succ in terminator.successors() {
                if let Some(n) = preds.get_mut(succ.0 as usize) {
                    *n += 1;
                }
            }
        }
    }
    preds
}

/// Merge one `a: br b` pair where `b` has no other predecessor. The emptied
/// block becomes unreachable and is cleaned up by the caller.
fn merge_one(function: &mut Function) -> bool {
    let preds = predecessor_counts(function);
    for a in 0..function.blocks.len() {
        let Some(Terminator::Br(b)) = function.blocks[a].terminator else {
            continue;
        };
        let b = b.0 as usize;
        if b == 0 || b == a || preds[b] != 1 {
            continue;
        }
        let moved = std::mem::take(&mut function.blocks[b].insts);
        let terminator = function.blocks[b].terminator.take();
        function.blocks[a].insts.extend(moved);
        function.blocks[a].terminator = terminator;
        // The emptied block now jumps to itself so it stays well formed
        // until it is removed as unreachable.
        function.blocks[b].terminator = Some(Terminator::Br(BlockId(b as u32)));
        return true;
    }
    false
}

impl Pass for SimplifyCfg {
    fn name(&self) -> &'static str {
        "simplify-cfg"
    }

    fn run(&mut self, function: &mut Function) -> Result<bool, PassError> {
        if function.is_declaration() {
            return Ok(false);
        }
        let mut changed = remove_unreachable(function);
        while merge_one(function) {
            remove_unreachable(function);
            changed = true;
        }
        Ok(changed)
    }
}
