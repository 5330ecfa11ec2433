//! Governance job queue
//!
//! Jobs move through `Created (inactive) -> Active -> Executed`. Arguments
//! may only be attached by the creator while the job is inactive; activation
//! freezes them. Each current approver holds exactly one live vote per job,
//! and switching sides re-tallies both counters instead of incrementing.

use cinder_core::{JobId, Principal, ProtocolError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A live vote held by an approver on an active job
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Vote {
    Approve,
    Disapprove,
}

/// Uint-valued job argument
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UintArgument {
    pub name: String,
    pub value: u128,
}

/// Principal-valued job argument
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PrincipalArgument {
    pub name: String,
    pub value: Principal,
}

/// A governance change-request
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Job {
    /// Monotonic id, assigned at creation
    pub id: JobId,

    /// Approver that created the job
    pub creator: Principal,

    /// Human-readable name
    pub name: String,

    /// Principal expected to execute the job
    pub target: Principal,

    /// Live approval count
    pub approvals: u32,

    /// Live disapproval count
    pub disapprovals: u32,

    /// Set once by the creator; freezes the argument map
    pub is_active: bool,

    /// Terminal flag; the job is immutable afterward
    pub is_executed: bool,

    uint_args: Vec<UintArgument>,
    principal_args: Vec<PrincipalArgument>,
    votes: HashMap<Principal, Vote>,
}

impl Job {
    fn new(id: JobId, creator: Principal, name: String, target: Principal) -> Self {
        Self {
            id,
            creator,
            name,
            target,
            approvals: 0,
            disapprovals: 0,
            is_active: false,
            is_executed: false,
            uint_args: Vec::new(),
            principal_args: Vec::new(),
            votes: HashMap::new(),
        }
    }

    /// Look up a uint argument by name
    pub fn uint_argument_by_name(&self, name: &str) -> Option<u128> {
        self.uint_args.iter().find(|a| a.name == name).map(|a| a.value)
    }

    /// Look up a uint argument by 1-based insertion id
    pub fn uint_argument_by_id(&self, arg_id: u32) -> Option<u128> {
        self.uint_args.get(arg_id.checked_sub(1)? as usize).map(|a| a.value)
    }

    /// Look up a principal argument by name
    pub fn principal_argument_by_name(&self, name: &str) -> Option<Principal> {
        self.principal_args
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value)
    }

    /// Look up a principal argument by 1-based insertion id
    pub fn principal_argument_by_id(&self, arg_id: u32) -> Option<Principal> {
        self.principal_args
            .get(arg_id.checked_sub(1)? as usize)
            .map(|a| a.value)
    }

    /// The live vote an approver currently holds, if any
    pub fn vote_of(&self, approver: &Principal) -> Option<Vote> {
        self.votes.get(approver).copied()
    }

    fn has_argument(&self, name: &str) -> bool {
        self.uint_args.iter().any(|a| a.name == name)
            || self.principal_args.iter().any(|a| a.name == name)
    }
}

/// Queue of governance jobs plus the current approver set
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JobQueue {
    jobs: Vec<Job>,
    approvers: Vec<Principal>,
    quorum: u32,
}

impl JobQueue {
    /// Create a queue with the initial approver set
    pub fn new(quorum: u32, approvers: Vec<Principal>) -> Self {
        Self {
            jobs: Vec::new(),
            approvers,
            quorum,
        }
    }

    /// Whether a principal is a current approver
    pub fn is_approver(&self, principal: &Principal) -> bool {
        self.approvers.contains(principal)
    }

    /// Current approver set
    pub fn approvers(&self) -> &[Principal] {
        &self.approvers
    }

    /// Number of jobs ever created
    pub fn job_count(&self) -> u64 {
        self.jobs.len() as u64
    }

    /// Create a job; only current approvers may create
    pub fn create_job(&mut self, caller: Principal, name: &str, target: Principal) -> Result<JobId> {
        if !self.is_approver(&caller) {
            return Err(ProtocolError::Unauthorized);
        }

        let id = self.jobs.len() as JobId + 1;
        self.jobs.push(Job::new(id, caller, name.to_string(), target));

        log::debug!("job {} created: {} (target {})", id, name, target);
        Ok(id)
    }

    /// Get a job by id
    pub fn get_job(&self, job_id: JobId) -> Result<&Job> {
        self.jobs
            .get(job_id.checked_sub(1).ok_or(ProtocolError::UnknownJob(job_id))? as usize)
            .ok_or(ProtocolError::UnknownJob(job_id))
    }

    fn get_job_mut(&mut self, job_id: JobId) -> Result<&mut Job> {
        self.jobs
            .get_mut(job_id.checked_sub(1).ok_or(ProtocolError::UnknownJob(job_id))? as usize)
            .ok_or(ProtocolError::UnknownJob(job_id))
    }

    /// Attach a uint argument; creator only, inactive jobs only
    pub fn add_uint_argument(
        &mut self,
        caller: Principal,
        job_id: JobId,
        name: &str,
        value: u128,
    ) -> Result<()> {
        let job = self.get_job_mut(job_id)?;

        if caller != job.creator {
            return Err(ProtocolError::Unauthorized);
        }
        if job.is_active {
            return Err(ProtocolError::JobIsActive(job_id));
        }
        if job.has_argument(name) {
            return Err(ProtocolError::ArgumentAlreadyExists {
                name: name.to_string(),
            });
        }

        job.uint_args.push(UintArgument {
            name: name.to_string(),
            value,
        });
        Ok(())
    }

    /// Attach a principal argument; creator only, inactive jobs only
    pub fn add_principal_argument(
        &mut self,
        caller: Principal,
        job_id: JobId,
        name: &str,
        value: Principal,
    ) -> Result<()> {
        let job = self.get_job_mut(job_id)?;

        if caller != job.creator {
            return Err(ProtocolError::Unauthorized);
        }
        if job.is_active {
            return Err(ProtocolError::JobIsActive(job_id));
        }
        if job.has_argument(name) {
            return Err(ProtocolError::ArgumentAlreadyExists {
                name: name.to_string(),
            });
        }

        job.principal_args.push(PrincipalArgument {
            name: name.to_string(),
            value,
        });
        Ok(())
    }

    /// Activate a job, freezing its arguments; creator only, once
    pub fn activate_job(&mut self, caller: Principal, job_id: JobId) -> Result<()> {
        let job = self.get_job_mut(job_id)?;

        if caller != job.creator {
            return Err(ProtocolError::Unauthorized);
        }
        if job.is_active {
            return Err(ProtocolError::JobIsActive(job_id));
        }

        job.is_active = true;
        log::debug!("job {} activated", job_id);
        Ok(())
    }

    /// Cast or switch an approval vote
    pub fn approve_job(&mut self, caller: Principal, job_id: JobId) -> Result<()> {
        self.cast_vote(caller, job_id, Vote::Approve)
    }

    /// Cast or switch a disapproval vote
    pub fn disapprove_job(&mut self, caller: Principal, job_id: JobId) -> Result<()> {
        self.cast_vote(caller, job_id, Vote::Disapprove)
    }

    fn cast_vote(&mut self, caller: Principal, job_id: JobId, vote: Vote) -> Result<()> {
        if !self.is_approver(&caller) {
            return Err(ProtocolError::Unauthorized);
        }

        let job = self.get_job_mut(job_id)?;
        if !job.is_active {
            return Err(ProtocolError::JobIsNotActive(job_id));
        }
        if job.is_executed {
            return Err(ProtocolError::JobIsExecuted(job_id));
        }

        match job.votes.get(&caller) {
            Some(current) if *current == vote => {
                return Err(ProtocolError::AlreadyVotedThisWay(job_id));
            }
            Some(Vote::Approve) => {
                job.approvals -= 1;
            }
            Some(Vote::Disapprove) => {
                job.disapprovals -= 1;
            }
            None => {}
        }

        match vote {
            Vote::Approve => job.approvals += 1,
            Vote::Disapprove => job.disapprovals += 1,
        }
        job.votes.insert(caller, vote);
        Ok(())
    }

    /// Whether a job has reached the approval quorum
    pub fn is_approved(&self, job_id: JobId) -> Result<bool> {
        let job = self.get_job(job_id)?;
        Ok(job.is_active && job.approvals >= self.quorum)
    }

    /// Mark a job executed; target only, approved jobs only, once
    pub fn mark_executed(&mut self, caller: Principal, job_id: JobId) -> Result<()> {
        let quorum = self.quorum;
        let job = self.get_job_mut(job_id)?;

        if !job.is_active {
            return Err(ProtocolError::JobIsNotActive(job_id));
        }
        if job.is_executed {
            return Err(ProtocolError::JobIsExecuted(job_id));
        }
        if caller != job.target {
            return Err(ProtocolError::Unauthorized);
        }
        if job.approvals < quorum {
            return Err(ProtocolError::JobIsNotApproved(job_id));
        }

        job.is_executed = true;
        log::info!("job {} executed by {}", job_id, caller);
        Ok(())
    }

    /// Flip the executed flag after an executor already validated the job
    pub(crate) fn set_executed(&mut self, job_id: JobId) {
        if let Ok(job) = self.get_job_mut(job_id) {
            job.is_executed = true;
            log::info!("job {} executed", job_id);
        }
    }

    /// Swap an approver; historical votes on existing jobs are untouched
    pub fn replace_approver(&mut self, old: Principal, new: Principal) -> Result<()> {
        if self.is_approver(&new) {
            return Err(ProtocolError::Unauthorized);
        }
        let slot = self
            .approvers
            .iter()
            .position(|a| *a == old)
            .ok_or(ProtocolError::Unauthorized)?;

        self.approvers[slot] = new;
        log::info!("approver {} replaced by {}", old, new);
        Ok(())
    }
}
