// # skyform-sdk
//
// Typed request/response layer over `skyform_core::ServiceClient`.
//
// ## Services
//
// - `evs::cloudvolumes`: Elastic Volume Service disks (create, get, update, extend, delete)
// - `evs::jobs`: asynchronous job records returned by EVS create calls
// - `vpc::natgateways`: NAT gateways (create, get, update, delete)
//
// ## Conventions
//
// Every operation is a free function taking the service client first and
// returning an `ApiResult`. Operations issue exactly one HTTP request and
// never wait for the remote side to converge; waiting is the job of
// `skyform_core::StateChangeConf`.
//
// Option structs mark field presence with `Option`. A `Some` field is always
// serialized, even when it holds a zero value.

pub mod evs;
pub mod time;
pub mod vpc;
