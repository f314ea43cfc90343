pub mod local_cluster;
