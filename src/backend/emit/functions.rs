use wasm_encoder::{BlockType, Function as WasmFunction, Instruction};

use crate::backend::context::LocalContext;
use crate::backend::{EmitError, WasmGenerator};
use crate::ir::Function;

impl WasmGenerator {
    /// Emit the body of a defined function.
    ///
    /// For blocks `b0..bN-1` the body is laid out as
    ///
    /// ```text
    /// loop
    ///   block            ;; bN-1
    ///     ...
    ///       block        ;; b0
    ///         local.get $pc
    ///         br_table 0 1 .. N-1
    ///       end
    ///       <code of b0>
    ///     ...
    ///   end
    ///   <code of bN-1>
    /// end
    /// unreachable
    /// ```
    ///
    /// `br_table` label `k` leaves the block right in front of the code of
    /// `bk`. A branch stores the target in `$pc` and jumps back to the `loop`.
    /// `$pc` starts out as 0, so execution begins at the entry block.
    pub(crate) fn gen_function(&self, func: &Function) -> Result<WasmFunction, EmitError> {
        let block_count = func.blocks.len() as u32;
        if block_count == 0 {
            return Err(EmitError::Malformed { function: func.name.clone(), what: "body".to_string() });
        }

        let ctx = LocalContext::new(func);
        let mut body = WasmFunction::new(ctx.declarations());

        body.instruction(&Instruction::Loop(BlockType::Empty));
        for _ in 0..block_count {
            body.instruction(&Instruction::Block(BlockType::Empty));
        }
        body.instruction(&Instruction::LocalGet(ctx.pc()));
        let targets: Vec<u32> = (0..block_count).collect();
        body.instruction(&Instruction::BrTable(targets.into(), block_count - 1));

        for (index, block) in func.blocks.iter().enumerate() {
            body.instruction(&Instruction::End);
            for &id in &block.insts {
                self.gen_inst(func, id, &ctx, &mut body)?;
            }
            let Some(terminator) = &block.terminator else {
                return Err(EmitError::Malformed {
                    function: func.name.clone(),
                    what: format!("terminator of '{}'", block.name),
                });
            };
            // Labels between this block's code and the loop.
            let loop_depth = block_count - 1 - index as u32;
            self.gen_terminator(func, terminator, loop_depth, &ctx, &mut body)?;
        }

        body.instruction(&Instruction::End);
        body.instruction(&Instruction::Unreachable);
        body.instruction(&Instruction::End);
        Ok(body)
    }
}
