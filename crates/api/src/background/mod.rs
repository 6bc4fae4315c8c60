pub mod permission_expiry;
