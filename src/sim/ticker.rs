use std::thread;
use std::time::{Duration, Instant};

//fixed-interval ticker, deadlines advance by exactly one interval
//if the loop falls behind by more than one interval, missed ticks are skipped
pub struct Ticker{
    interval: Duration,
    next: Instant,
}

impl Ticker{
    pub fn new(interval: Duration) -> Self{
        assert!(!interval.is_zero(), "Tick interval must be greater than 0");
        Ticker{
            interval,
            next: Instant::now() + interval,
        }
    }

    pub fn interval(&self) -> Duration{
        self.interval
    }

    //block until the next deadline, return how many ticks were skipped
    pub fn wait(&mut self) -> u64{
        let now = Instant::now();
        if now < self.next{
            thread::sleep(self.next - now);
        }
        self.advance(Instant::now())
    }

    fn advance(&mut self, now: Instant) -> u64{
        self.next += self.interval;
        if now < self.next{
            return 0;
        }

        let behind = now - self.next;
        let missed = (behind.as_nanos() / self.interval.as_nanos()) as u64 + 1;
        self.next += self.interval * missed as u32;
        missed
    }
}

#[cfg(test)]
mod tests{
    use super::*;

    #[test]
    fn test_ticks_at_fixed_cadence(){
        let mut ticker = Ticker::new(Duration::from_millis(10));
        let start = Instant::now();
        for _ in 0..5{
            ticker.wait();
        }
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(40));
        assert!(elapsed < Duration::from_millis(500));
    }

    #[test]
    fn test_skips_when_behind(){
        let mut ticker = Ticker::new(Duration::from_millis(10));
        let deadline = ticker.next;
        //pretend the tick body took 35ms past the deadline
        let missed = ticker.advance(deadline + Duration::from_millis(35));
        assert_eq!(missed, 3);
        assert!(ticker.next > deadline + Duration::from_millis(35));
    }

    #[test]
    #[should_panic]
    fn test_zero_interval_rejected(){
        Ticker::new(Duration::ZERO);
    }
}
