use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use crate::frame::{ControlCommand, Gear};

//packed layout of the slot word
//  bits  0..8   rudder angle
//  bits  8..16  speed command
//  bits 16..24  gear
//  bits 24..64  epoch (0 = nothing published yet)
const EPOCH_SHIFT: u32 = 24;
const PAYLOAD_MASK: u64 = (1 << EPOCH_SHIFT) - 1;
const MAX_EPOCH: u64 = (1 << (64 - EPOCH_SHIFT)) - 1;

fn pack(cmd: &ControlCommand, epoch: u64) -> u64{
    let [rudder, speed, gear] = cmd.to_bytes();
    (epoch << EPOCH_SHIFT) | ((gear as u64) << 16) | ((speed as u64) << 8) | rudder as u64
}

fn unpack(word: u64) -> (ControlCommand, u64){
    let payload = word & PAYLOAD_MASK;
    let rudder_angle = (payload & 0xFF) as u8 as i8;
    let speed_command = ((payload >> 8) & 0xFF) as u8 as i8;
    //only validated commands are ever packed
    let gear = Gear::from_i8(((payload >> 16) & 0xFF) as u8 as i8).unwrap_or_default();
    (ControlCommand{ rudder_angle, speed_command, gear }, word >> EPOCH_SHIFT)
}

//lock free single slot holding the latest control command and its epoch
//a publish overwrites whatever was there, readers never consume
pub struct CommandSlot{
    word: AtomicU64,
}

impl CommandSlot{
    pub fn new() -> Self{
        CommandSlot{ word: AtomicU64::new(0) }
    }

    //store the command, return the epoch of this publish
    pub fn publish(&self, cmd: ControlCommand) -> u64{
        let mut epoch = 0;
        let _ = self.word.fetch_update(Ordering::AcqRel, Ordering::Acquire, |old|{
            let next = (old >> EPOCH_SHIFT) + 1;
            //wrap to 1, 0 is reserved for the empty slot
            epoch = if next > MAX_EPOCH { 1 } else { next };
            Some(pack(&cmd, epoch))
        });
        epoch
    }

    pub fn latest(&self) -> Option<(ControlCommand, u64)>{
        let (cmd, epoch) = unpack(self.word.load(Ordering::Acquire));
        if epoch == 0{
            return None;
        }
        Some((cmd, epoch))
    }

    //idle command until the first frame arrives
    pub fn latest_or_default(&self) -> ControlCommand{
        self.latest().map(|(cmd, _)| cmd).unwrap_or_default()
    }

    pub fn latest_epoch(&self) -> u64{
        self.word.load(Ordering::Acquire) >> EPOCH_SHIFT
    }
}

impl Default for CommandSlot{
    fn default() -> Self{
        Self::new()
    }
}

//reader side with freshness tracking
pub struct CommandReader{
    slot: Arc<CommandSlot>,
    last_seen_epoch: AtomicU64,
}

impl CommandReader{
    pub fn new(slot: Arc<CommandSlot>) -> Self{
        CommandReader{
            slot,
            last_seen_epoch: AtomicU64::new(0),
        }
    }

    pub fn current(&self) -> ControlCommand{
        self.slot.latest_or_default()
    }

    pub fn has_new(&self) -> bool{
        let current = self.slot.latest_epoch();
        let last = self.last_seen_epoch.load(Ordering::SeqCst);
        current != last
    }

    pub fn mark_seen(&self){
        let current = self.slot.latest_epoch();
        self.last_seen_epoch.store(current, Ordering::SeqCst);
    }

    //one load of the slot: the command plus whether its epoch is unseen,
    //the epoch recorded is the one that came with the command
    pub fn poll(&self) -> (ControlCommand, bool){
        match self.slot.latest(){
            Some((cmd, epoch)) =>{
                let last = self.last_seen_epoch.swap(epoch, Ordering::SeqCst);
                (cmd, last != epoch)
            }
            None => (ControlCommand::default(), false),
        }
    }
}
