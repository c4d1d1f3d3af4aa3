#[macro_export]
macro_rules! record_wo_desc {
    ($e1:expr,$e2:expr) => {
        bio::io::fasta::Record::with_attrs($e1, None, $e2)
    };
}

#[macro_export]
macro_rules! tree {
    ($e:expr) => {
        $crate::tree::tree_parser::from_newick($e)
            .unwrap()
            .pop()
            .unwrap()
    };
}
