//! Cycle-stepped CPU for Vesper-16 machine code.
//!
//! Registers live in a flat big-endian byte block, mirroring main memory's
//! layout, with each register at `index * 2`. The stack grows downward from
//! the top of memory; `sp` points at the next free word because pushes write
//! before decrementing.

use miette::Result;

use crate::error;
use crate::isa::{Opcode, Reg, REGISTER_COUNT};
use crate::memory::Memory;

/// Entries in the interrupt vector table.
const VECTOR_COUNT: u16 = 16;

/// Registers saved and restored by call frames, in bank order. `acc` is the
/// caller-visible result channel and `sp`/`fp` are managed by the frame
/// itself, so none of those are included.
const FRAME_SAVED: [Reg; 11] = [
    Reg::R0,
    Reg::R1,
    Reg::R2,
    Reg::R3,
    Reg::R4,
    Reg::R5,
    Reg::R6,
    Reg::R7,
    Reg::Mb,
    Reg::Im,
    Reg::Pc,
];

pub struct Cpu<M: Memory> {
    memory: M,
    registers: [u8; REGISTER_COUNT * 2],
    /// Bytes pushed since the last call boundary.
    stack_frame_size: u16,
    interrupt_vector: u16,
    in_interrupt_handler: bool,
}

impl<M: Memory> Cpu<M> {
    pub fn new(memory: M) -> Self {
        Self::with_interrupt_vector(memory, 0x1000)
    }

    pub fn with_interrupt_vector(memory: M, interrupt_vector: u16) -> Self {
        let mut cpu = Cpu {
            memory,
            registers: [0; REGISTER_COUNT * 2],
            stack_frame_size: 0,
            interrupt_vector,
            in_interrupt_handler: false,
        };
        // All interrupts enabled; stack at the last full word of memory.
        cpu.set_reg(Reg::Im, 0xFFFF);
        cpu.set_reg(Reg::Sp, 0xFFFE);
        cpu.set_reg(Reg::Fp, 0xFFFE);
        cpu
    }

    pub fn memory(&self) -> &M {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut M {
        &mut self.memory
    }

    fn reg(&self, reg: Reg) -> u16 {
        let at = reg.offset();
        u16::from_be_bytes([self.registers[at], self.registers[at + 1]])
    }

    fn set_reg(&mut self, reg: Reg, value: u16) {
        let at = reg.offset();
        self.registers[at..at + 2].copy_from_slice(&value.to_be_bytes());
    }

    /// Read a register by its label. Unknown labels are an error.
    pub fn get_register(&self, label: &str) -> Result<u16> {
        label
            .parse::<Reg>()
            .map(|reg| self.reg(reg))
            .map_err(|_| error::run_unknown_register(label))
    }

    /// Write a register by its label. Unknown labels are an error.
    pub fn set_register(&mut self, label: &str, value: u16) -> Result<()> {
        let reg = label
            .parse::<Reg>()
            .map_err(|_| error::run_unknown_register(label))?;
        self.set_reg(reg, value);
        Ok(())
    }

    /// Snapshot of every register, in bank order.
    pub fn register_bank(&self) -> Vec<(&'static str, u16)> {
        Reg::ALL
            .iter()
            .map(|&reg| (reg.label(), self.reg(reg)))
            .collect()
    }

    /// Format `count` bytes of memory starting at `addr`.
    pub fn view_memory_at(&self, addr: u16, count: usize) -> Result<String> {
        let mut bytes = Vec::with_capacity(count);
        for i in 0..count {
            bytes.push(self.memory.read_u8(addr.wrapping_add(i as u16))?);
        }
        let words = bytes
            .iter()
            .map(|b| format!("0x{b:02x}"))
            .collect::<Vec<_>>()
            .join(" ");
        Ok(format!("0x{addr:04x}: {words}"))
    }

    fn fetch(&mut self) -> Result<u8> {
        let pc = self.reg(Reg::Pc);
        let byte = self.memory.read_u8(pc)?;
        self.set_reg(Reg::Pc, pc.wrapping_add(1));
        Ok(byte)
    }

    fn fetch16(&mut self) -> Result<u16> {
        let pc = self.reg(Reg::Pc);
        let word = self.memory.read_u16(pc)?;
        self.set_reg(Reg::Pc, pc.wrapping_add(2));
        Ok(word)
    }

    fn fetch_reg(&mut self) -> Result<Reg> {
        Ok(Reg::from_index(self.fetch()?))
    }

    fn push(&mut self, value: u16) -> Result<()> {
        let sp = self.reg(Reg::Sp);
        self.memory.write_u16(sp, value)?;
        self.set_reg(Reg::Sp, sp.wrapping_sub(2));
        self.stack_frame_size = self.stack_frame_size.wrapping_add(2);
        Ok(())
    }

    fn pop(&mut self) -> Result<u16> {
        let sp = self.reg(Reg::Sp).wrapping_add(2);
        self.set_reg(Reg::Sp, sp);
        self.stack_frame_size = self.stack_frame_size.wrapping_sub(2);
        self.memory.read_u16(sp)
    }

    /// Save the frame registers and the running frame size, then open a new
    /// frame at the current stack top.
    fn push_state(&mut self) -> Result<()> {
        for reg in FRAME_SAVED {
            self.push(self.reg(reg))?;
        }
        // +2 accounts for the frame-size slot itself.
        self.push(self.stack_frame_size.wrapping_add(2))?;
        self.set_reg(Reg::Fp, self.reg(Reg::Sp));
        self.stack_frame_size = 0;
        Ok(())
    }

    /// Unwind the current frame: restore the saved registers, drop the
    /// caller's pushed argument-count words, and repoint `fp` at the
    /// enclosing frame.
    fn pop_state(&mut self) -> Result<()> {
        let fp_addr = self.reg(Reg::Fp);
        self.set_reg(Reg::Sp, fp_addr);
        let frame_size = self.pop()?;
        self.stack_frame_size = frame_size;

        for reg in FRAME_SAVED.iter().rev() {
            let value = self.pop()?;
            self.set_reg(*reg, value);
        }

        let arg_count = self.pop()?;
        let sp = self.reg(Reg::Sp).wrapping_add(arg_count.wrapping_mul(2));
        self.set_reg(Reg::Sp, sp);
        self.set_reg(Reg::Fp, fp_addr.wrapping_add(frame_size));
        Ok(())
    }

    /// Dispatch interrupt `id` through the vector table, honoring the `im`
    /// mask bit for its vector. Nested interrupts run in the existing
    /// handler frame rather than saving state again.
    fn handle_interrupt(&mut self, id: u16) -> Result<()> {
        let index = id % VECTOR_COUNT;
        let unmasked = (1u16 << index) & self.reg(Reg::Im) != 0;
        if !unmasked {
            return Ok(());
        }

        let pointer = self.interrupt_vector.wrapping_add(index * 2);
        let handler = self.memory.read_u16(pointer)?;

        if !self.in_interrupt_handler {
            // Handlers receive no arguments.
            self.push(0)?;
            self.push_state()?;
        }

        self.in_interrupt_handler = true;
        self.set_reg(Reg::Pc, handler);
        Ok(())
    }

    /// One fetch/decode/execute cycle. Returns true when the machine halts.
    pub fn cycle(&mut self) -> Result<bool> {
        let at = self.reg(Reg::Pc);
        let byte = self.fetch()?;
        let opcode = Opcode::decode(byte).ok_or_else(|| error::run_invalid_opcode(byte, at))?;
        self.execute(opcode)
    }

    /// Run cycles until halt. Pacing is the caller's concern.
    pub fn run(&mut self) -> Result<()> {
        while !self.cycle()? {}
        Ok(())
    }

    fn execute(&mut self, opcode: Opcode) -> Result<bool> {
        match opcode {
            Opcode::MovLitReg => {
                let value = self.fetch16()?;
                let dest = self.fetch_reg()?;
                self.set_reg(dest, value);
            }
            Opcode::MovRegReg => {
                let src = self.fetch_reg()?;
                let dest = self.fetch_reg()?;
                self.set_reg(dest, self.reg(src));
            }
            Opcode::MovRegMem => {
                let src = self.fetch_reg()?;
                let addr = self.fetch16()?;
                self.memory.write_u16(addr, self.reg(src))?;
            }
            Opcode::MovMemReg => {
                let addr = self.fetch16()?;
                let dest = self.fetch_reg()?;
                let value = self.memory.read_u16(addr)?;
                self.set_reg(dest, value);
            }
            Opcode::MovLitMem => {
                let value = self.fetch16()?;
                let addr = self.fetch16()?;
                self.memory.write_u16(addr, value)?;
            }
            Opcode::MovRegIndReg => {
                let base = self.fetch_reg()?;
                let dest = self.fetch_reg()?;
                let value = self.memory.read_u16(self.reg(base))?;
                self.set_reg(dest, value);
            }
            Opcode::MovLitOffReg => {
                let base = self.fetch16()?;
                let offset_reg = self.fetch_reg()?;
                let dest = self.fetch_reg()?;
                let addr = base.wrapping_add(self.reg(offset_reg));
                let value = self.memory.read_u16(addr)?;
                self.set_reg(dest, value);
            }

            Opcode::AddRegReg => {
                let x = self.fetch_reg()?;
                let y = self.fetch_reg()?;
                self.set_reg(Reg::Acc, self.reg(x).wrapping_add(self.reg(y)));
            }
            Opcode::AddLitReg => {
                let lit = self.fetch16()?;
                let reg = self.fetch_reg()?;
                self.set_reg(Reg::Acc, self.reg(reg).wrapping_add(lit));
            }
            Opcode::SubLitReg => {
                let lit = self.fetch16()?;
                let reg = self.fetch_reg()?;
                self.set_reg(Reg::Acc, self.reg(reg).wrapping_sub(lit));
            }
            Opcode::SubRegLit => {
                let reg = self.fetch_reg()?;
                let lit = self.fetch16()?;
                self.set_reg(Reg::Acc, lit.wrapping_sub(self.reg(reg)));
            }
            Opcode::SubRegReg => {
                let x = self.fetch_reg()?;
                let y = self.fetch_reg()?;
                self.set_reg(Reg::Acc, self.reg(x).wrapping_sub(self.reg(y)));
            }
            Opcode::MulLitReg => {
                let lit = self.fetch16()?;
                let reg = self.fetch_reg()?;
                self.set_reg(Reg::Acc, self.reg(reg).wrapping_mul(lit));
            }
            Opcode::MulRegReg => {
                let x = self.fetch_reg()?;
                let y = self.fetch_reg()?;
                self.set_reg(Reg::Acc, self.reg(x).wrapping_mul(self.reg(y)));
            }

            Opcode::IncReg => {
                let reg = self.fetch_reg()?;
                self.set_reg(reg, self.reg(reg).wrapping_add(1));
            }
            Opcode::DecReg => {
                let reg = self.fetch_reg()?;
                self.set_reg(reg, self.reg(reg).wrapping_sub(1));
            }

            Opcode::LslRegLit => {
                let reg = self.fetch_reg()?;
                let count = self.fetch16()?;
                self.set_reg(reg, shl16(self.reg(reg), count));
            }
            Opcode::LslRegReg => {
                let reg = self.fetch_reg()?;
                let count_reg = self.fetch_reg()?;
                self.set_reg(reg, shl16(self.reg(reg), self.reg(count_reg)));
            }
            Opcode::LsrRegLit => {
                let reg = self.fetch_reg()?;
                let count = self.fetch16()?;
                self.set_reg(reg, shr16(self.reg(reg), count));
            }
            Opcode::LsrRegReg => {
                let reg = self.fetch_reg()?;
                let count_reg = self.fetch_reg()?;
                self.set_reg(reg, shr16(self.reg(reg), self.reg(count_reg)));
            }

            Opcode::AndRegLit => {
                let reg = self.fetch_reg()?;
                let lit = self.fetch16()?;
                self.set_reg(Reg::Acc, self.reg(reg) & lit);
            }
            Opcode::AndRegReg => {
                let x = self.fetch_reg()?;
                let y = self.fetch_reg()?;
                self.set_reg(Reg::Acc, self.reg(x) & self.reg(y));
            }
            Opcode::OrRegLit => {
                let reg = self.fetch_reg()?;
                let lit = self.fetch16()?;
                self.set_reg(Reg::Acc, self.reg(reg) | lit);
            }
            Opcode::OrRegReg => {
                let x = self.fetch_reg()?;
                let y = self.fetch_reg()?;
                self.set_reg(Reg::Acc, self.reg(x) | self.reg(y));
            }
            Opcode::XorRegLit => {
                let reg = self.fetch_reg()?;
                let lit = self.fetch16()?;
                self.set_reg(Reg::Acc, self.reg(reg) ^ lit);
            }
            Opcode::XorRegReg => {
                let x = self.fetch_reg()?;
                let y = self.fetch_reg()?;
                self.set_reg(Reg::Acc, self.reg(x) ^ self.reg(y));
            }
            Opcode::NotReg => {
                let reg = self.fetch_reg()?;
                self.set_reg(Reg::Acc, !self.reg(reg));
            }

            Opcode::JneLit => self.branch_lit(|v, acc| v != acc)?,
            Opcode::JneReg => self.branch_reg(|v, acc| v != acc)?,
            Opcode::JeqLit => self.branch_lit(|v, acc| v == acc)?,
            Opcode::JeqReg => self.branch_reg(|v, acc| v == acc)?,
            Opcode::JltLit => self.branch_lit(|v, acc| v < acc)?,
            Opcode::JltReg => self.branch_reg(|v, acc| v < acc)?,
            Opcode::JgtLit => self.branch_lit(|v, acc| v > acc)?,
            Opcode::JgtReg => self.branch_reg(|v, acc| v > acc)?,
            Opcode::JleLit => self.branch_lit(|v, acc| v <= acc)?,
            Opcode::JleReg => self.branch_reg(|v, acc| v <= acc)?,
            Opcode::JgeLit => self.branch_lit(|v, acc| v >= acc)?,
            Opcode::JgeReg => self.branch_reg(|v, acc| v >= acc)?,

            Opcode::PshLit => {
                let value = self.fetch16()?;
                self.push(value)?;
            }
            Opcode::PshReg => {
                let reg = self.fetch_reg()?;
                self.push(self.reg(reg))?;
            }
            Opcode::PopReg => {
                let dest = self.fetch_reg()?;
                let value = self.pop()?;
                self.set_reg(dest, value);
            }

            Opcode::CalLit => {
                let addr = self.fetch16()?;
                self.push_state()?;
                self.set_reg(Reg::Pc, addr);
            }
            Opcode::CalReg => {
                let reg = self.fetch_reg()?;
                let addr = self.reg(reg);
                self.push_state()?;
                self.set_reg(Reg::Pc, addr);
            }
            Opcode::Ret => self.pop_state()?,

            Opcode::Int => {
                let id = self.fetch16()?;
                self.handle_interrupt(id)?;
            }
            Opcode::Rti => {
                self.in_interrupt_handler = false;
                self.pop_state()?;
            }

            Opcode::Hlt => return Ok(true),
        }
        Ok(false)
    }

    /// Jump form comparing a fetched literal against `acc`.
    fn branch_lit(&mut self, cond: fn(u16, u16) -> bool) -> Result<()> {
        let value = self.fetch16()?;
        let addr = self.fetch16()?;
        if cond(value, self.reg(Reg::Acc)) {
            self.set_reg(Reg::Pc, addr);
        }
        Ok(())
    }

    /// Jump form comparing a register's contents against `acc`.
    fn branch_reg(&mut self, cond: fn(u16, u16) -> bool) -> Result<()> {
        let reg = self.fetch_reg()?;
        let value = self.reg(reg);
        let addr = self.fetch16()?;
        if cond(value, self.reg(Reg::Acc)) {
            self.set_reg(Reg::Pc, addr);
        }
        Ok(())
    }
}

fn shl16(value: u16, count: u16) -> u16 {
    if count >= 16 {
        0
    } else {
        value << count
    }
}

fn shr16(value: u16, count: u16) -> u16 {
    if count >= 16 {
        0
    } else {
        value >> count
    }
}

#[cfg(test)]
mod tests {
    use crate::assembler::assemble;
    use crate::memory::{MemoryMapper, Ram};

    use super::*;

    fn boot(src: &str) -> Cpu<Ram> {
        let asm = assemble(src).unwrap();
        let mut ram = Ram::new();
        ram.load(0, &asm.bytes);
        Cpu::new(ram)
    }

    fn load_at(cpu: &mut Cpu<Ram>, addr: u16, src: &str) {
        let asm = assemble(src).unwrap();
        cpu.memory_mut().load(addr, &asm.bytes);
    }

    #[test]
    fn registers_start_in_known_state() {
        let cpu = Cpu::new(Ram::new());
        assert_eq!(cpu.get_register("sp").unwrap(), 0xFFFE);
        assert_eq!(cpu.get_register("fp").unwrap(), 0xFFFE);
        assert_eq!(cpu.get_register("im").unwrap(), 0xFFFF);
        assert_eq!(cpu.get_register("pc").unwrap(), 0);
        assert!(cpu.get_register("r9").is_err());
    }

    #[test]
    fn add_lands_in_acc() {
        let mut cpu = boot("mov $1234, r1\nmov $ABCD, r2\nadd r1, r2\nhlt");
        cpu.run().unwrap();
        assert_eq!(cpu.get_register("r1").unwrap(), 0x1234);
        assert_eq!(cpu.get_register("r2").unwrap(), 0xABCD);
        assert_eq!(cpu.get_register("acc").unwrap(), 0xBE01);
    }

    #[test]
    fn arithmetic_wraps_at_16_bits() {
        let mut cpu = boot("mov $FFFF, r1\nadd $2, r1\nhlt");
        cpu.run().unwrap();
        assert_eq!(cpu.get_register("acc").unwrap(), 1);
    }

    #[test]
    fn sub_operand_orders() {
        // sub $5, r1 computes r1 - 5; sub r1, $5 computes 5 - r1.
        let mut cpu = boot("mov $8, r1\nsub $5, r1\nhlt");
        cpu.run().unwrap();
        assert_eq!(cpu.get_register("acc").unwrap(), 3);

        let mut cpu = boot("mov $8, r1\nsub r1, $5\nhlt");
        cpu.run().unwrap();
        assert_eq!(cpu.get_register("acc").unwrap(), 0xFFFD);
    }

    #[test]
    fn moves_between_registers_and_memory() {
        let mut cpu = boot("mov $8, &100\nmov $100, r6\nmov &r6, r7\nhlt");
        cpu.run().unwrap();
        assert_eq!(cpu.memory().read_u16(0x100).unwrap(), 8);
        assert_eq!(cpu.get_register("r6").unwrap(), 0x100);
        assert_eq!(cpu.get_register("r7").unwrap(), 8);
    }

    #[test]
    fn lit_off_reg_adds_base_and_register_offset() {
        let mut cpu = boot("mov $90, &4A\nmov $45, &r5, r5\nhlt");
        cpu.set_register("r5", 5).unwrap();
        cpu.run().unwrap();
        // Loads from 0x45 + 5 = 0x4A.
        assert_eq!(cpu.get_register("r5").unwrap(), 0x90);
    }

    #[test]
    fn in_place_operations_write_back_to_the_register() {
        let mut cpu = boot("mov $2, r1\nlsl r1, $3\ninc r1\ndec r2\nhlt");
        cpu.run().unwrap();
        assert_eq!(cpu.get_register("r1").unwrap(), 17);
        assert_eq!(cpu.get_register("r2").unwrap(), 0xFFFF);
        // acc untouched by in-place forms.
        assert_eq!(cpu.get_register("acc").unwrap(), 0);
    }

    #[test]
    fn shift_counts_of_16_or_more_clear_the_register() {
        let mut cpu = boot("mov $FFFF, r1\nlsl r1, $10\nhlt");
        cpu.run().unwrap();
        assert_eq!(cpu.get_register("r1").unwrap(), 0);
    }

    #[test]
    fn bitwise_results_land_in_acc() {
        let mut cpu = boot("mov $F0F0, r1\nand r1, $FF00\nhlt");
        cpu.run().unwrap();
        assert_eq!(cpu.get_register("acc").unwrap(), 0xF000);

        let mut cpu = boot("mov $F0F0, r1\nnot r1\nhlt");
        cpu.run().unwrap();
        assert_eq!(cpu.get_register("acc").unwrap(), 0x0F0F);
    }

    #[test]
    fn jeq_compares_against_acc() {
        // acc becomes 2, r2 holds 2: branch taken.
        let mut cpu = boot("add $2, r0\njeq r2, &C0DE");
        cpu.set_register("r2", 2).unwrap();
        cpu.cycle().unwrap();
        cpu.cycle().unwrap();
        assert_eq!(cpu.get_register("pc").unwrap(), 0xC0DE);

        // r1 holds 1: fall through.
        let mut cpu = boot("add $2, r0\njeq r1, &C0DE");
        cpu.set_register("r1", 1).unwrap();
        cpu.cycle().unwrap();
        cpu.cycle().unwrap();
        assert_eq!(cpu.get_register("pc").unwrap(), 8);
    }

    #[test]
    fn push_and_pop_move_sp_by_words() {
        let mut cpu = boot("psh r4\npsh $1\npsh r6\npop r1\npop r2\npop r3\nhlt");
        cpu.set_register("r4", 4).unwrap();
        cpu.set_register("r6", 6).unwrap();

        cpu.cycle().unwrap();
        assert_eq!(cpu.get_register("sp").unwrap(), 0xFFFC);
        assert_eq!(cpu.memory().read_u16(0xFFFE).unwrap(), 4);

        cpu.run().unwrap();
        assert_eq!(cpu.get_register("r1").unwrap(), 6);
        assert_eq!(cpu.get_register("r2").unwrap(), 1);
        assert_eq!(cpu.get_register("r3").unwrap(), 4);
        assert_eq!(cpu.get_register("sp").unwrap(), 0xFFFE);
    }

    #[test]
    fn call_saves_and_ret_restores_the_frame() {
        let main = "\
psh $3333
psh $2222
mov $1234, r1
mov $5151, r4
psh $0
cal $3000
hlt
";
        let sub = "\
psh $102
psh $304
mov $0708, r1
ret
";
        let mut cpu = boot(main);
        load_at(&mut cpu, 0x3000, sub);

        // Up to and including psh $0.
        for _ in 0..5 {
            cpu.cycle().unwrap();
        }
        let before_branch_sp = cpu.get_register("sp").unwrap();

        // cal: 11 saved registers plus the frame-size slot.
        cpu.cycle().unwrap();
        assert_eq!(cpu.get_register("pc").unwrap(), 0x3000);
        assert_eq!(
            cpu.get_register("sp").unwrap(),
            before_branch_sp - 11 * 2 - 2
        );
        assert_eq!(cpu.get_register("fp").unwrap(), cpu.get_register("sp").unwrap());

        // Subroutine body clobbers r1, then returns.
        for _ in 0..4 {
            cpu.cycle().unwrap();
        }
        assert_eq!(cpu.get_register("r1").unwrap(), 0x1234);
        assert_eq!(cpu.get_register("r4").unwrap(), 0x5151);
        // The argument-count word was dropped along with the frame.
        assert_eq!(cpu.get_register("sp").unwrap(), before_branch_sp + 2);
        assert_eq!(cpu.get_register("fp").unwrap(), 0xFFFE);
    }

    #[test]
    fn interrupts_dispatch_through_the_vector_table() {
        let mut cpu = boot("int $3\nhlt");
        // Vector entry 3 points at 0x2000, which immediately returns.
        cpu.memory_mut().load(0x1000 + 3 * 2, &[0x20, 0x00]);
        load_at(&mut cpu, 0x2000, "rti");

        cpu.cycle().unwrap();
        assert_eq!(cpu.get_register("pc").unwrap(), 0x2000);

        // rti unwinds back to the instruction after int.
        cpu.cycle().unwrap();
        assert_eq!(cpu.get_register("pc").unwrap(), 3);
        assert_eq!(cpu.get_register("sp").unwrap(), 0xFFFE);
    }

    #[test]
    fn masked_interrupts_are_ignored() {
        let mut cpu = boot("int $3\nhlt");
        cpu.memory_mut().load(0x1000 + 3 * 2, &[0x20, 0x00]);
        cpu.set_register("im", !(1 << 3)).unwrap();

        cpu.cycle().unwrap();
        assert_eq!(cpu.get_register("pc").unwrap(), 3);
        assert_eq!(cpu.get_register("sp").unwrap(), 0xFFFE);
    }

    #[test]
    fn nested_interrupts_skip_the_state_save() {
        let mut cpu = boot("int $3\nhlt");
        cpu.memory_mut().load(0x1000 + 3 * 2, &[0x20, 0x00]);
        cpu.memory_mut().load(0x1000 + 4 * 2, &[0x28, 0x00]);
        load_at(&mut cpu, 0x2000, "int $4");

        cpu.cycle().unwrap();
        let sp_in_handler = cpu.get_register("sp").unwrap();

        cpu.cycle().unwrap();
        assert_eq!(cpu.get_register("pc").unwrap(), 0x2800);
        assert_eq!(cpu.get_register("sp").unwrap(), sp_in_handler);
    }

    #[test]
    fn hlt_stops_the_run_loop() {
        let mut cpu = boot("mov $1, r1\nhlt\nmov $2, r1");
        cpu.run().unwrap();
        assert_eq!(cpu.get_register("r1").unwrap(), 1);
    }

    #[test]
    fn invalid_opcode_is_fatal() {
        let mut ram = Ram::new();
        ram.load(0, &[0x00]);
        let mut cpu = Cpu::new(ram);
        assert!(cpu.cycle().is_err());
    }

    #[test]
    fn unmapped_fetch_is_fatal() {
        let mut mapper = MemoryMapper::new();
        mapper.map(Box::new(Ram::new()), 0x4000, 0x4FFF, true);
        let mut cpu = Cpu::new(mapper);
        assert!(cpu.cycle().is_err());
    }

    #[test]
    fn view_memory_formats_a_window() {
        let mut cpu = boot("hlt");
        cpu.memory_mut().load(0x0F01, &[0x04, 0xAB, 0x7F]);
        let view = cpu.view_memory_at(0x0F01, 3).unwrap();
        assert_eq!(view, "0x0f01: 0x04 0xab 0x7f");
    }
}
